use super::core::{BuildOptions, build_project, load_project};
use crate::cmake::CMAKELISTS;
use crate::gitignore::GITIGNORE;
use crate::settings::Settings;
use anyhow::Result;
use colored::*;
use notify::{Config, Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Rebuild whenever a project file changes.
///
/// Events under the build directory and on generated files are ignored so a
/// build never retriggers itself.
pub fn watch(project_dir: &Path, options: &BuildOptions, settings: &Settings) -> Result<()> {
    println!(
        "{} Watching {} for changes... (Ctrl+C to stop)",
        "👀".cyan(),
        project_dir.display()
    );

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    watcher.watch(project_dir, RecursiveMode::Recursive)?;

    run_and_clear(project_dir, options, settings);

    while let Ok(event) = rx.recv() {
        let ignored = ignored_paths(project_dir, options, settings);
        let mut relevant = is_relevant(&event, &ignored);

        // Debounce
        std::thread::sleep(Duration::from_millis(100));
        while let Ok(next) = rx.try_recv() {
            relevant |= is_relevant(&next, &ignored);
        }

        if relevant {
            run_and_clear(project_dir, options, settings);
        }
    }
    Ok(())
}

fn ignored_paths(project_dir: &Path, options: &BuildOptions, settings: &Settings) -> Vec<PathBuf> {
    let mut ignored = vec![
        project_dir.join(CMAKELISTS),
        project_dir.join(GITIGNORE),
        project_dir.join(".git"),
        project_dir.join("install_manifest.txt"),
    ];
    if let Ok(info) = load_project(project_dir, &options.buildfile, settings) {
        ignored.push(project_dir.join(&info.builddir));
        let exec_dir = match &options.exec_dir {
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        };
        ignored.extend(info.executables().map(|t| exec_dir.join(&t.name)));
    }
    ignored
}

fn is_relevant(event: &notify::Result<Event>, ignored: &[PathBuf]) -> bool {
    match event {
        Ok(event) => event
            .paths
            .iter()
            .any(|p| !ignored.iter().any(|i| p.starts_with(i))),
        Err(_) => false,
    }
}

fn run_and_clear(project_dir: &Path, options: &BuildOptions, settings: &Settings) {
    print!("\x1B[2J\x1B[1;1H");
    println!("{} Change detected. Rebuilding...", "🔄".yellow());

    match build_project(project_dir, options, settings) {
        Ok(0) => {}
        Ok(code) => println!("{} Build exited with code {}", "x".red(), code),
        Err(e) => println!("{} Error: {}", "x".red(), e),
    }
}
