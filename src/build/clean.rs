//! Build artifact cleanup.
//!
//! `build --clean` removes the build directory named in the manifest, the
//! executables placed in the project root and `install_manifest.txt`.
//! `CMakeLists.txt` and `.gitignore` stay, they are regenerated from the
//! manifest anyway.

use super::core::{BuildOptions, load_project};
use crate::settings::Settings;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

pub fn clean(project_dir: &Path, options: &BuildOptions, settings: &Settings) -> Result<()> {
    let info = load_project(project_dir, &options.buildfile, settings)?;
    let mut cleaned = false;

    // builddir is validated to lie strictly inside the project on load
    let build_dir = project_dir.join(&info.builddir);
    if build_dir.is_dir() {
        fs::remove_dir_all(&build_dir)
            .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
        println!("{} Removed {}", "🗑️".red(), info.builddir.display());
        cleaned = true;
    }

    let exec_dir = match &options.exec_dir {
        Some(dir) => project_dir.join(dir),
        None => project_dir.to_path_buf(),
    };
    for target in info.executables() {
        let name = if cfg!(target_os = "windows") {
            format!("{}.exe", target.name)
        } else {
            target.name.clone()
        };
        let exe = exec_dir.join(name);
        if exe.is_file() {
            fs::remove_file(&exe).with_context(|| format!("Failed to remove {}", exe.display()))?;
            println!("{} Removed {}", "🗑️".red(), exe.display());
            cleaned = true;
        }
    }

    let install_manifest = project_dir.join("install_manifest.txt");
    if install_manifest.is_file() {
        fs::remove_file(&install_manifest).context("Failed to remove install_manifest.txt")?;
        cleaned = true;
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_artifacts() {
        let dir = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        fs::write(
            dir.path().join("build.info"),
            r#"{ "projectname": "p", "builddir": "out", "targets": [
                { "name": "app", "srcs": ["main.c"] },
                { "name": "core", "type": "staticlib", "srcs": ["core.c"] }
            ] }"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("out/CMakeFiles")).unwrap();
        let exe = if cfg!(target_os = "windows") { "app.exe" } else { "app" };
        fs::write(dir.path().join(exe), "binary").unwrap();
        fs::write(dir.path().join("main.c"), "int main(void) { return 0; }").unwrap();

        let settings = Settings {
            data_dir: Some(data.path().to_path_buf()),
            ..Default::default()
        };
        clean(dir.path(), &BuildOptions::default(), &settings).unwrap();

        assert!(!dir.path().join("out").exists());
        assert!(!dir.path().join(exe).exists());
        assert!(dir.path().join("main.c").exists());
        assert!(dir.path().join("build.info").exists());
    }

    #[test]
    fn test_clean_refuses_builddir_outside_project() {
        let parent = TempDir::new().unwrap();
        let project = parent.path().join("project");
        let sibling = parent.path().join("sibling");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(
            project.join("build.info"),
            r#"{ "projectname": "p", "builddir": "..", "targets": [
                { "name": "app", "srcs": ["main.c"] }
            ] }"#,
        )
        .unwrap();
        let data = TempDir::new().unwrap();
        let settings = Settings {
            data_dir: Some(data.path().to_path_buf()),
            ..Default::default()
        };

        let err = clean(&project, &BuildOptions::default(), &settings).unwrap_err();
        assert!(err.to_string().contains("Invalid builddir"));
        assert!(sibling.is_dir());
        assert!(project.join("build.info").is_file());
    }
}
