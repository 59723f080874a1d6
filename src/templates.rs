//! Project templates for `build --init`.
//!
//! A template is a `build.info` plus starter files. The built-in templates
//! below are always available; every directory under `<data dir>/templates`
//! adds a template of the same name (replacing a built-in one).
//!
//! ## Built-in Templates
//!
//! - `default` - C++ console application
//! - `c` - C console application
//! - `library` - static C++ library with a ctest-registered test executable

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::manifest::DEFAULT_BUILDFILE;

/// Placeholder replaced by the project name inside a template's `build.info`.
pub const PROJECT_PLACEHOLDER: &str = "${project}";

type TemplateFiles = &'static [(&'static str, &'static str)];

const BUILTIN_TEMPLATES: &[(&str, TemplateFiles)] = &[
    ("c", C_TEMPLATE),
    ("default", DEFAULT_TEMPLATE),
    ("library", LIBRARY_TEMPLATE),
];

const DEFAULT_TEMPLATE: TemplateFiles = &[
    (
        "build.info",
        r#"{
    "projectname": "${project}",
    "builddir": "build.dir",
    "flags": "-std=c++17 -Wall -Wextra",
    "targets": [
        {
            "name": "${project}",
            "srcs": ["src/*.cpp"]
        }
    ]
}"#,
    ),
    (
        "src/main.cpp",
        r#"#include <iostream>

int main() {
    std::cout << "Hello, world!" << std::endl;
    return 0;
}
"#,
    ),
];

const C_TEMPLATE: TemplateFiles = &[
    (
        "build.info",
        r#"{
    "projectname": "${project}",
    "builddir": "build.dir",
    "flags": "-std=c11 -Wall -Wextra",
    "targets": [
        {
            "name": "${project}",
            "srcs": ["src/*.c"]
        }
    ]
}"#,
    ),
    (
        "src/main.c",
        r#"#include <stdio.h>

int main(void) {
    printf("Hello, world!\n");
    return 0;
}
"#,
    ),
];

const LIBRARY_TEMPLATE: TemplateFiles = &[
    (
        "build.info",
        r#"{
    "projectname": "${project}",
    "builddir": "build.dir",
    "flags": "-std=c++17 -Wall -Wextra",
    "include_dirs": ["include"],
    "targets": [
        {
            "name": "${project}",
            "type": "staticlib",
            "srcs": ["src/*.cpp"],
            "install_to": ["lib"],
            "install_includes": ["include/*.h"]
        },
        {
            "name": "${project}_test",
            "srcs": ["test/*.cpp"],
            "libraries": ["${project}"],
            "test": true
        }
    ]
}"#,
    ),
    (
        "include/greeting.h",
        r#"#pragma once

#include <string>

std::string greeting(const std::string& name);
"#,
    ),
    (
        "src/greeting.cpp",
        r#"#include "greeting.h"

std::string greeting(const std::string& name) {
    return "Hello, " + name + "!";
}
"#,
    ),
    (
        "test/greeting_test.cpp",
        r#"#include "greeting.h"

#include <iostream>

int main() {
    if (greeting("world") != "Hello, world!") {
        std::cerr << "unexpected greeting" << std::endl;
        return 1;
    }
    return 0;
}
"#,
    ),
];

#[derive(Debug)]
pub enum TemplateError {
    /// No template of that name exists
    Unknown { name: String, valid: Vec<String> },
    /// The template lacks a `build.info`
    MissingBuildInfo(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Unknown { name, valid } => write!(
                f,
                "Invalid template \"{}\". Valid templates: {}",
                name,
                valid.join(", ")
            ),
            TemplateError::MissingBuildInfo(name) => {
                write!(f, "Invalid template \"{}\". Missing build.info", name)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Where a template's files come from.
#[derive(Debug, Clone)]
pub enum Template {
    Builtin(&'static str, TemplateFiles),
    Directory(String, PathBuf),
}

impl Template {
    pub fn name(&self) -> &str {
        match self {
            Template::Builtin(name, _) => *name,
            Template::Directory(name, _) => name.as_str(),
        }
    }
}

/// What `copy_template` wrote.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub created: Vec<PathBuf>,
    /// Files that already existed and were left untouched.
    pub skipped: Vec<PathBuf>,
}

/// Sorted names of every available template.
pub fn all_templates(templates_dir: &Path) -> Vec<String> {
    let mut names: BTreeSet<String> = BUILTIN_TEMPLATES
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();

    if let Ok(entries) = fs::read_dir(templates_dir) {
        names.extend(
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().to_string()),
        );
    }
    names.into_iter().collect()
}

pub fn find_template(templates_dir: &Path, name: &str) -> Result<Template, TemplateError> {
    // A template name is a single directory name, never a path
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\']);
    if !plain {
        return Err(TemplateError::Unknown {
            name: name.to_string(),
            valid: all_templates(templates_dir),
        });
    }

    let dir = templates_dir.join(name);
    if dir.is_dir() {
        return Ok(Template::Directory(name.to_string(), dir));
    }
    BUILTIN_TEMPLATES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|&(builtin, files)| Template::Builtin(builtin, files))
        .ok_or_else(|| TemplateError::Unknown {
            name: name.to_string(),
            valid: all_templates(templates_dir),
        })
}

/// Instantiate `template` into `project_dir`.
///
/// The manifest is written to `buildfile` with the project name substituted;
/// every other template file is copied unless a file of that name exists.
pub fn copy_template(
    project_dir: &Path,
    buildfile: &Path,
    projectname: &str,
    template: &Template,
) -> Result<CopyReport> {
    let mut report = CopyReport::default();

    let manifest = match template {
        Template::Builtin(name, files) => files
            .iter()
            .find(|(path, _)| *path == DEFAULT_BUILDFILE)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| TemplateError::MissingBuildInfo(name.to_string()))?,
        Template::Directory(name, dir) => {
            let path = dir.join(DEFAULT_BUILDFILE);
            if !path.is_file() {
                return Err(TemplateError::MissingBuildInfo(name.clone()).into());
            }
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
    };

    let buildfile_path = project_dir.join(buildfile);
    let mut manifest = manifest.replace(PROJECT_PLACEHOLDER, projectname);
    manifest.truncate(manifest.trim_end().len());
    manifest.push('\n');
    fs::write(&buildfile_path, manifest)
        .with_context(|| format!("Failed to write {}", buildfile_path.display()))?;
    report.created.push(buildfile_path);

    match template {
        Template::Builtin(_, files) => {
            for (rel, content) in files.iter().filter(|(p, _)| *p != DEFAULT_BUILDFILE) {
                write_new(&project_dir.join(rel), content.as_bytes(), &mut report)?;
            }
        }
        Template::Directory(_, dir) => {
            for entry in WalkDir::new(dir).min_depth(1).into_iter().filter_map(|e| e.ok()) {
                let Ok(rel) = entry.path().strip_prefix(dir) else {
                    continue;
                };
                if rel == Path::new(DEFAULT_BUILDFILE) {
                    continue;
                }
                let dest = project_dir.join(rel);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&dest)
                        .with_context(|| format!("Failed to create {}", dest.display()))?;
                } else {
                    let content = fs::read(entry.path())
                        .with_context(|| format!("Failed to read {}", entry.path().display()))?;
                    write_new(&dest, &content, &mut report)?;
                }
            }
        }
    }

    Ok(report)
}

fn write_new(dest: &Path, content: &[u8], report: &mut CopyReport) -> Result<()> {
    if dest.exists() {
        report.skipped.push(dest.to_path_buf());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dest, content).with_context(|| format!("Failed to write {}", dest.display()))?;
    report.created.push(dest.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildInfoConfig;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_manifests_are_valid() {
        for (name, files) in BUILTIN_TEMPLATES {
            let (_, manifest) = files
                .iter()
                .find(|(p, _)| *p == DEFAULT_BUILDFILE)
                .unwrap_or_else(|| panic!("{name} has no build.info"));
            let manifest = manifest.replace(PROJECT_PLACEHOLDER, "demo");
            let cfg: BuildInfoConfig = serde_json::from_str(&manifest)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(cfg.projectname, "demo");
        }
    }

    #[test]
    fn test_all_templates_sorted_with_user_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("qt")).unwrap();
        fs::create_dir_all(dir.path().join("arduino")).unwrap();
        fs::write(dir.path().join("README"), "not a template").unwrap();

        assert_eq!(
            all_templates(dir.path()),
            vec!["arduino", "c", "default", "library", "qt"]
        );
    }

    #[test]
    fn test_unknown_template() {
        let dir = TempDir::new().unwrap();
        let err = find_template(dir.path(), "rust").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid template \"rust\". Valid templates: c, default, library"
        );
    }

    #[test]
    fn test_template_name_is_not_a_path() {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        let outside = root.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(
            outside.join("build.info"),
            r#"{"projectname": "x", "builddir": "b", "targets": []}"#,
        )
        .unwrap();

        let absolute = outside.to_string_lossy().to_string();
        for name in ["../outside", absolute.as_str(), "a/b", "..", ".", ""] {
            let err = find_template(&templates, name).unwrap_err();
            assert!(
                matches!(err, TemplateError::Unknown { .. }),
                "{name} accepted"
            );
        }
    }

    #[test]
    fn test_copy_builtin() {
        let templates = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let template = find_template(templates.path(), "default").unwrap();

        let report =
            copy_template(project.path(), Path::new("build.info"), "hello", &template).unwrap();

        let manifest = fs::read_to_string(project.path().join("build.info")).unwrap();
        assert!(manifest.contains("\"projectname\": \"hello\""));
        assert!(!manifest.contains(PROJECT_PLACEHOLDER));
        assert!(manifest.ends_with("}\n"));
        assert!(project.path().join("src/main.cpp").exists());
        assert_eq!(report.created.len(), 2);
    }

    #[test]
    fn test_copy_directory_template_keeps_existing_files() {
        let templates = TempDir::new().unwrap();
        let tdir = templates.path().join("custom");
        fs::create_dir_all(tdir.join("src/sub")).unwrap();
        fs::write(
            tdir.join("build.info"),
            r#"{"projectname": "${project}", "builddir": "out", "targets": []}"#,
        )
        .unwrap();
        fs::write(tdir.join("src/sub/a.c"), "int a;").unwrap();
        fs::write(tdir.join("README.md"), "template readme").unwrap();

        let project = TempDir::new().unwrap();
        fs::write(project.path().join("README.md"), "mine").unwrap();

        let template = find_template(templates.path(), "custom").unwrap();
        assert_eq!(template.name(), "custom");
        let report =
            copy_template(project.path(), Path::new("build.info"), "x", &template).unwrap();

        assert_eq!(
            fs::read_to_string(project.path().join("src/sub/a.c")).unwrap(),
            "int a;"
        );
        assert_eq!(
            fs::read_to_string(project.path().join("README.md")).unwrap(),
            "mine"
        );
        assert_eq!(report.skipped, vec![project.path().join("README.md")]);
        assert!(
            fs::read_to_string(project.path().join("build.info"))
                .unwrap()
                .contains("\"x\"")
        );
    }

    #[test]
    fn test_directory_template_without_manifest() {
        let templates = TempDir::new().unwrap();
        fs::create_dir_all(templates.path().join("broken")).unwrap();
        let project = TempDir::new().unwrap();

        let template = find_template(templates.path(), "broken").unwrap();
        let err = copy_template(project.path(), Path::new("build.info"), "x", &template)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid template \"broken\". Missing build.info");
    }
}
