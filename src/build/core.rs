use super::process::{self, run_command};
use crate::cmake::{self, CMAKELISTS};
use crate::gitignore;
use crate::library;
use crate::manifest::{self, BuildInfo, DEFAULT_BUILDFILE};
use crate::settings::Settings;
use crate::sources;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Tool run after the configure step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Configure only; extra arguments go to cmake
    Cmake,
    #[default]
    Make,
    Ctest,
}

impl Action {
    /// Split positional arguments into the action and the arguments for it.
    ///
    /// A leading `cmake`, `make` or `ctest` selects that action. Anything else
    /// is forwarded to make untouched.
    pub fn split(args: &[String]) -> (Action, Vec<String>) {
        match args.first().map(String::as_str) {
            Some("cmake") => (Action::Cmake, args[1..].to_vec()),
            Some("make") => (Action::Make, args[1..].to_vec()),
            Some("ctest") => (Action::Ctest, args[1..].to_vec()),
            _ => (Action::Make, args.to_vec()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub buildfile: PathBuf,
    pub action: Action,
    /// Arguments forwarded to the action's tool.
    pub args: Vec<String>,
    pub run_cmake: bool,
    pub run_make: bool,
    pub make_git: bool,
    pub sudo: bool,
    /// Where executables are placed; the project root when unset.
    pub exec_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            buildfile: PathBuf::from(DEFAULT_BUILDFILE),
            action: Action::Make,
            args: Vec::new(),
            run_cmake: true,
            run_make: true,
            make_git: true,
            sudo: false,
            exec_dir: None,
            verbose: false,
        }
    }
}

/// `CMakeLists.txt` is missing or older than the manifest.
pub fn needs_regeneration(buildfile: &Path, cmakelists: &Path) -> Result<bool> {
    if !cmakelists.is_file() {
        return Ok(true);
    }
    let manifest_time = fs::metadata(buildfile)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", buildfile.display()))?;
    let cmake_time = fs::metadata(cmakelists)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", cmakelists.display()))?;
    Ok(manifest_time > cmake_time)
}

/// Load library definitions and the manifest of `project_dir`.
pub fn load_project(project_dir: &Path, buildfile: &Path, settings: &Settings) -> Result<BuildInfo> {
    let libraries = library::load_all(&settings.libs_dir())?;
    let info = manifest::load(&project_dir.join(buildfile), &libraries)?;
    Ok(info)
}

/// Regenerate what is stale, then run cmake and the requested tool.
///
/// Returns the exit code of the first tool that failed, or 0.
pub fn build_project(project_dir: &Path, options: &BuildOptions, settings: &Settings) -> Result<i32> {
    let start_time = Instant::now();
    let buildfile = project_dir.join(&options.buildfile);
    let info = load_project(project_dir, &options.buildfile, settings)?;

    println!(
        "{} Project: {} ({} target{})",
        "🚀".blue(),
        info.projectname.bold(),
        info.targets.len(),
        if info.targets.len() == 1 { "" } else { "s" }
    );

    let need_init = needs_regeneration(&buildfile, &project_dir.join(CMAKELISTS))?;
    if options.verbose {
        println!(
            "   {} {} is {}",
            "·".dimmed(),
            CMAKELISTS,
            if need_init { "stale" } else { "up to date" }
        );
    }

    let mut is_git = process::is_git_repo(project_dir);
    if !is_git && options.make_git && settings.git_enabled() {
        let code = process::git_init(project_dir)?;
        if code == 0 {
            is_git = true;
        } else {
            println!("{} git init failed (exit code {})", "!".yellow(), code);
        }
    }

    let build_dir = project_dir.join(&info.builddir);
    fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create build directory {}", build_dir.display()))?;

    let check = sources::check(project_dir, &info)?;
    let mut need_cmake = check.changed;
    if options.verbose && check.changed {
        println!("   {} Source listing changed", "·".dimmed());
    }

    let mut run_cmake = options.run_cmake;
    let mut run_tool = true;
    if !check.empty_targets.is_empty() {
        println!(
            "{} No source files found for {}; skipping cmake and make",
            "!".yellow(),
            check.empty_targets.join(", ").bold()
        );
        run_cmake = false;
        run_tool = false;
    }

    if need_init {
        println!("{} Generating {}", "⚙".cyan(), CMAKELISTS);
        cmake::write(&info, project_dir)?;
        if is_git {
            println!("{} Generating {}", "⚙".cyan(), gitignore::GITIGNORE);
            gitignore::write(&info, project_dir)?;
        }
        need_cmake = true;
    }

    if !build_dir.join("CMakeCache.txt").exists() || options.action == Action::Cmake {
        need_cmake = true;
    }

    if need_cmake && run_cmake {
        let mut command = cmake_command(project_dir, options);
        if options.action == Action::Cmake {
            command.extend(options.args.iter().cloned());
        }
        let code = run_command(&command, &build_dir)?;
        if code != 0 {
            println!("{} cmake failed (exit code {})", "x".red(), code);
            return Ok(code);
        }
        sources::save(project_dir, &info, &check)?;
    } else if options.verbose {
        println!("   {} Skipping cmake", "·".dimmed());
    }

    if !run_tool {
        return Ok(0);
    }

    let code = match options.action {
        Action::Cmake => 0,
        Action::Make if options.run_make => {
            run_command(&make_command(options, settings), &build_dir)?
        }
        Action::Make => 0,
        Action::Ctest => {
            let mut command = vec!["ctest".to_string()];
            command.extend(options.args.iter().cloned());
            run_command(&command, &build_dir)?
        }
    };

    if code == 0 {
        println!(
            "{} Finished in {:.2?}",
            "✓".green(),
            start_time.elapsed()
        );
    } else {
        println!("{} Build failed (exit code {})", "x".red(), code);
    }
    Ok(code)
}

fn exec_dir(project_dir: &Path, options: &BuildOptions) -> PathBuf {
    match &options.exec_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => project_dir.join(dir),
        None => project_dir.to_path_buf(),
    }
}

pub fn cmake_command(project_dir: &Path, options: &BuildOptions) -> Vec<String> {
    vec![
        "cmake".to_string(),
        format!(
            "-DCMAKE_RUNTIME_OUTPUT_DIRECTORY={}",
            exec_dir(project_dir, options).display()
        ),
        project_dir.display().to_string(),
    ]
}

pub fn make_command(options: &BuildOptions, settings: &Settings) -> Vec<String> {
    let mut command = Vec::new();
    if options.sudo {
        command.push("sudo".to_string());
    }
    command.push("make".to_string());

    let has_jobs = options
        .args
        .iter()
        .any(|a| a.starts_with("-j") || a.starts_with("--jobs"));
    if let Some(jobs) = settings.make_jobs
        && !has_jobs
    {
        command.push(format!("-j{}", jobs));
    }
    command.extend(options.args.iter().cloned());
    command
}
