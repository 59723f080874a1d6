//! Source pattern expansion and per-target source snapshots.
//!
//! CMake evaluates `file(GLOB_RECURSE ...)` only at configure time, so a new
//! or deleted source file needs a cmake rerun. The expanded listing of every
//! target is stored in `<builddir>/srcs/<target>` after a successful cmake
//! run and compared on each run.

use crate::manifest::BuildInfo;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const SNAPSHOT_DIR: &str = "srcs";

/// Outcome of comparing the current listings with the stored snapshots.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SourceCheck {
    /// At least one target's listing differs from its snapshot.
    pub changed: bool,
    /// Targets whose patterns matched nothing.
    pub empty_targets: Vec<String>,
    /// Current listing of every target, in manifest order.
    pub listings: Vec<(String, Vec<PathBuf>)>,
}

/// Expand one `srcs` entry relative to `project_dir`.
///
/// An entry without `*` is returned as is. Otherwise the path is split at the
/// first component holding a wildcard; the part before it is the search root
/// and the rest is matched at any depth beneath that root. `skip` lists
/// directories (relative to `project_dir`) that are never descended into.
pub fn expand(project_dir: &Path, pattern: &Path, skip: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let parts: Vec<String> = pattern
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    let Some(first_wild) = parts.iter().position(|p| p.contains('*')) else {
        return Ok(vec![pattern.to_path_buf()]);
    };

    let root: PathBuf = pattern.components().take(first_wild).collect();
    let matcher = pattern_regex(&parts[first_wild..])?;

    let search_root = project_dir.join(&root);
    if !search_root.is_dir() {
        return Ok(Vec::new());
    }
    let skip: Vec<PathBuf> = skip.iter().map(|s| project_dir.join(s)).collect();

    let mut found = Vec::new();
    let walker = WalkDir::new(&search_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            !hidden && !skip.iter().any(|s| e.path() == s)
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&search_root) else {
            continue;
        };
        if matcher.is_match(&slash_path(relative)) {
            found.push(root.join(relative));
        }
    }

    found.sort();
    Ok(found)
}

/// Expand every entry of `srcs`, keeping manifest order between entries.
pub fn expand_all(project_dir: &Path, srcs: &[PathBuf], skip: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut all = Vec::new();
    for pattern in srcs {
        all.extend(expand(project_dir, pattern, skip)?);
    }
    Ok(all)
}

/// Compare the current listings with the stored snapshots under
/// `<builddir>/srcs`. Nothing is written; see [`save`].
pub fn check(project_dir: &Path, info: &BuildInfo) -> Result<SourceCheck> {
    let snapshot_dir = project_dir.join(&info.builddir).join(SNAPSHOT_DIR);
    let previous = read_snapshots(&snapshot_dir)?;
    let skip = vec![info.builddir.clone()];
    let mut result = SourceCheck::default();

    for target in &info.targets {
        let srcs = expand_all(project_dir, &target.srcs, &skip)?;
        if srcs.is_empty() {
            result.empty_targets.push(target.name.clone());
        }
        if previous.get(&target.name) != Some(&srcs) {
            result.changed = true;
        }
        result.listings.push((target.name.clone(), srcs));
    }

    Ok(result)
}

/// Replace all stored snapshots with the listings of `check`.
///
/// Only call this once cmake has seen those listings, otherwise a change
/// would be forgotten before it reached the build.
pub fn save(project_dir: &Path, info: &BuildInfo, check: &SourceCheck) -> Result<()> {
    let snapshot_dir = project_dir.join(&info.builddir).join(SNAPSHOT_DIR);
    fs::create_dir_all(&snapshot_dir)
        .with_context(|| format!("Failed to create {}", snapshot_dir.display()))?;

    for entry in fs::read_dir(&snapshot_dir)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove snapshot {}", path.display()))?;
        }
    }

    for (name, srcs) in &check.listings {
        let mut content: String = srcs
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        content.push('\n');
        let path = snapshot_dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn read_snapshots(snapshot_dir: &Path) -> Result<HashMap<String, Vec<PathBuf>>> {
    let mut snapshots = HashMap::new();
    let Ok(entries) = fs::read_dir(snapshot_dir) else {
        return Ok(snapshots);
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let listing = content
            .lines()
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect();
        snapshots.insert(entry.file_name().to_string_lossy().to_string(), listing);
    }
    Ok(snapshots)
}

fn pattern_regex(parts: &[String]) -> Result<Regex> {
    let mut re = String::from("^(?:[^/]+/)*");
    for (i, part) in parts.iter().enumerate() {
        let last = i + 1 == parts.len();
        if part == "**" {
            re.push_str(if last { ".*" } else { "(?:[^/]+/)*" });
            continue;
        }
        for c in part.chars() {
            match c {
                '*' => re.push_str("[^/]*"),
                '?' => re.push_str("[^/]"),
                c => re.push_str(&regex::escape(&c.to_string())),
            }
        }
        if !last {
            re.push('/');
        }
    }
    re.push('$');
    Regex::new(&re).with_context(|| format!("Invalid source pattern {}", parts.join("/")))
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Libraries;
    use crate::manifest;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.cpp");
        touch(dir.path(), "src/util/strings.cpp");
        touch(dir.path(), "src/util/strings.h");
        touch(dir.path(), "src/.hidden/skip.cpp");
        touch(dir.path(), "other.cpp");
        dir
    }

    #[test]
    fn test_literal_entry_passthrough() {
        let dir = project();
        let out = expand(dir.path(), Path::new("src/missing.c"), &[]).unwrap();
        assert_eq!(out, vec![PathBuf::from("src/missing.c")]);
    }

    #[test]
    fn test_pattern_recurses_below_root() {
        let dir = project();
        let out = expand(dir.path(), Path::new("src/*.cpp"), &[]).unwrap();
        assert_eq!(
            out,
            vec![
                PathBuf::from("src/main.cpp"),
                PathBuf::from("src/util/strings.cpp")
            ]
        );
    }

    #[test]
    fn test_pattern_with_directory_part() {
        let dir = project();
        let out = expand(dir.path(), Path::new("src/util*/*.h"), &[]).unwrap();
        assert_eq!(out, vec![PathBuf::from("src/util/strings.h")]);
    }

    #[test]
    fn test_root_pattern_skips_builddir() {
        let dir = project();
        touch(dir.path(), "build.dir/CMakeFiles/probe.cpp");
        let out = expand(dir.path(), Path::new("*.cpp"), &[PathBuf::from("build.dir")]).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.contains(&PathBuf::from("other.cpp")));
        assert!(!out.iter().any(|p| p.starts_with("build.dir")));
    }

    #[test]
    fn test_missing_root_matches_nothing() {
        let dir = project();
        assert!(expand(dir.path(), Path::new("lib/*.c"), &[]).unwrap().is_empty());
    }

    fn resolve(json: &str) -> BuildInfo {
        manifest::resolve(serde_json::from_str(json).unwrap(), &Libraries::new()).unwrap()
    }

    #[test]
    fn test_snapshot_change_detection() {
        let dir = project();
        let info = resolve(
            r#"{ "projectname": "p", "builddir": "build.dir",
                 "targets": [{ "name": "app", "srcs": ["src/*.cpp"] }] }"#,
        );

        let first = check(dir.path(), &info).unwrap();
        assert!(first.changed);
        assert!(!dir.path().join("build.dir/srcs/app").exists());
        save(dir.path(), &info, &first).unwrap();
        assert!(!check(dir.path(), &info).unwrap().changed);

        touch(dir.path(), "src/new.cpp");
        let second = check(dir.path(), &info).unwrap();
        assert!(second.changed);
        save(dir.path(), &info, &second).unwrap();
        assert!(!check(dir.path(), &info).unwrap().changed);

        let snapshot = fs::read_to_string(dir.path().join("build.dir/srcs/app")).unwrap();
        assert!(snapshot.contains("src/new.cpp"));
    }

    #[test]
    fn test_unsaved_change_is_reported_again() {
        let dir = project();
        let info = resolve(
            r#"{ "projectname": "p", "builddir": "build.dir",
                 "targets": [{ "name": "app", "srcs": ["src/*.cpp"] }] }"#,
        );
        save(dir.path(), &info, &check(dir.path(), &info).unwrap()).unwrap();

        touch(dir.path(), "src/extra.cpp");
        assert!(check(dir.path(), &info).unwrap().changed);
        // cmake failed, nothing saved
        assert!(check(dir.path(), &info).unwrap().changed);
    }

    #[test]
    fn test_empty_targets_and_stale_snapshots() {
        let dir = project();
        touch(dir.path(), "build.dir/srcs/removed");
        let info = resolve(
            r#"{ "projectname": "p", "builddir": "build.dir",
                 "targets": [{ "name": "empty", "srcs": ["nothing/*.c"] }] }"#,
        );

        let result = check(dir.path(), &info).unwrap();
        assert_eq!(result.empty_targets, vec!["empty".to_string()]);
        assert!(dir.path().join("build.dir/srcs/removed").exists());

        save(dir.path(), &info, &result).unwrap();
        assert!(!dir.path().join("build.dir/srcs/removed").exists());
        assert!(dir.path().join("build.dir/srcs/empty").exists());
    }
}
