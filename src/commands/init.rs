//! `build --init NAME [--template T]`

use anyhow::{Result, bail};
use colored::*;
use std::io::IsTerminal;
use std::path::Path;

use crate::build::{self, BuildOptions};
use crate::settings::Settings;
use crate::templates;
use crate::ui;

/// Copy the template into `project_dir`, then run the normal build.
///
/// Returns the build's exit code.
pub fn init_project(
    project_dir: &Path,
    name: &str,
    template: Option<&str>,
    options: &BuildOptions,
    settings: &Settings,
) -> Result<i32> {
    if name.trim().is_empty() {
        bail!("Project name must not be empty");
    }

    let template_name = template.unwrap_or_else(|| settings.default_template());
    let template = templates::find_template(&settings.templates_dir(), template_name)?;

    let buildfile = project_dir.join(&options.buildfile);
    if buildfile.exists() && !confirm_overwrite(&options.buildfile)? {
        bail!(
            "{} already exists. Remove it first or initialize another directory",
            options.buildfile.display()
        );
    }

    let report = templates::copy_template(project_dir, &options.buildfile, name, &template)?;
    for skipped in &report.skipped {
        ui::warn(&format!(
            "{} exists, keeping it",
            skipped.strip_prefix(project_dir).unwrap_or(skipped).display()
        ));
    }
    println!(
        "{} Created project {} (template: {})",
        "✓".green(),
        name.bold(),
        template.name().cyan()
    );

    build::build_project(project_dir, options, settings)
}

fn confirm_overwrite(buildfile: &Path) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    let answer = inquire::Confirm::new(&format!("{} exists. Overwrite it?", buildfile.display()))
        .with_default(false)
        .prompt()?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings(data: &Path) -> Settings {
        Settings {
            data_dir: Some(data.to_path_buf()),
            ..Default::default()
        }
    }

    fn offline_options() -> BuildOptions {
        BuildOptions {
            run_cmake: false,
            run_make: false,
            make_git: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_init_default_template() {
        let project = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();

        let code = init_project(
            project.path(),
            "hello",
            None,
            &offline_options(),
            &settings(data.path()),
        )
        .unwrap();

        assert_eq!(code, 0);
        assert!(project.path().join("build.info").exists());
        assert!(project.path().join("src/main.cpp").exists());
        let cmake = fs::read_to_string(project.path().join("CMakeLists.txt")).unwrap();
        assert!(cmake.contains("project(hello)"));
    }

    #[test]
    fn test_init_unknown_template() {
        let project = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();

        let err = init_project(
            project.path(),
            "hello",
            Some("fortran"),
            &offline_options(),
            &settings(data.path()),
        )
        .unwrap_err();

        assert!(err.to_string().starts_with("Invalid template \"fortran\""));
        assert!(!project.path().join("build.info").exists());
    }

    #[test]
    fn test_init_refuses_existing_manifest_without_terminal() {
        let project = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        fs::write(project.path().join("build.info"), "{}").unwrap();

        // Only meaningful when stdin is not a terminal
        if std::io::stdin().is_terminal() {
            return;
        }
        let err = init_project(
            project.path(),
            "hello",
            None,
            &offline_options(),
            &settings(data.path()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            fs::read_to_string(project.path().join("build.info")).unwrap(),
            "{}"
        );
    }
}
