//! Resolved project model built from `build.info`.
//!
//! Project-wide `flags`, `libraries` and `include_dirs` are folded into every
//! target, and library names are resolved against the known definitions plus
//! the library targets of the manifest itself.

use crate::config::{BuildInfoConfig, TargetConfig, TargetType};
use crate::library::{Libraries, Library};
use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_BUILDFILE: &str = "build.info";

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub kind: TargetType,
    pub srcs: Vec<PathBuf>,
    pub flags: String,
    pub libraries: Vec<Library>,
    pub include_dirs: Vec<PathBuf>,
    pub install_to: Vec<PathBuf>,
    pub install_includes: Vec<PathBuf>,
    pub test: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildInfo {
    pub projectname: String,
    pub builddir: PathBuf,
    pub copy: Vec<String>,
    pub targets: Vec<Target>,
}

impl BuildInfo {
    pub fn executables(&self) -> impl Iterator<Item = &Target> {
        self.targets
            .iter()
            .filter(|t| t.kind == TargetType::Executable)
    }

    pub fn has_installs(&self) -> bool {
        self.targets.iter().any(|t| !t.install_to.is_empty())
    }

    pub fn has_tests(&self) -> bool {
        self.targets.iter().any(|t| t.test)
    }
}

#[derive(Debug)]
pub enum ManifestError {
    /// Manifest file does not exist
    NotFound(PathBuf),
    /// Manifest could not be read
    Read(PathBuf, std::io::Error),
    /// Manifest is not valid JSON of the expected shape
    Parse(PathBuf, serde_json::Error),
    /// A target names a library nobody defines
    UnknownLibrary { library: String, target: String },
    /// Two targets share a name
    DuplicateTarget(String),
    /// A target has an empty name
    EmptyTargetName,
    /// A target lists no source entries
    NoSources(String),
    /// A target name that cannot be used as a file name
    InvalidTargetName(String),
    /// `builddir` does not point strictly inside the project
    InvalidBuildDir(String),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::NotFound(path) => write!(
                f,
                "Build info file \"{}\" does not exist. Run \"build --help\" for help",
                path.display()
            ),
            ManifestError::Read(path, e) => {
                write!(f, "Failed to read \"{}\": {}", path.display(), e)
            }
            ManifestError::Parse(path, e) => {
                write!(f, "Invalid build info file \"{}\": {}", path.display(), e)
            }
            ManifestError::UnknownLibrary { library, target } => {
                write!(f, "Unknown library \"{}\" in target \"{}\"", library, target)
            }
            ManifestError::DuplicateTarget(name) => {
                write!(f, "Target \"{}\" is defined more than once", name)
            }
            ManifestError::EmptyTargetName => write!(f, "Target names must not be empty"),
            ManifestError::NoSources(name) => {
                write!(f, "Target \"{}\" does not list any srcs", name)
            }
            ManifestError::InvalidTargetName(name) => write!(
                f,
                "Invalid target name \"{}\": names must not contain path separators or be \".\" or \"..\"",
                name
            ),
            ManifestError::InvalidBuildDir(dir) => write!(
                f,
                "Invalid builddir \"{}\": it must be a relative path inside the project",
                dir
            ),
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Read(_, e) => Some(e),
            ManifestError::Parse(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Read and resolve a manifest file.
pub fn load(path: &Path, libraries: &Libraries) -> Result<BuildInfo, ManifestError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| ManifestError::Read(path.to_path_buf(), e))?;
    let config: BuildInfoConfig =
        serde_json::from_str(&content).map_err(|e| ManifestError::Parse(path.to_path_buf(), e))?;
    resolve(config, libraries)
}

pub fn resolve(config: BuildInfoConfig, libraries: &Libraries) -> Result<BuildInfo, ManifestError> {
    if !is_project_subdir(Path::new(&config.builddir)) {
        return Err(ManifestError::InvalidBuildDir(config.builddir));
    }
    validate(&config.targets)?;

    // Library targets can be linked by name from other targets
    let mut all_libraries = libraries.clone();
    for target in &config.targets {
        if target.kind.unwrap_or_default().is_library() {
            all_libraries.insert(target.name.clone(), Library::local(&target.name));
        }
    }

    let base_flags = config.flags.unwrap_or_default();
    let base_libs = config.libraries.unwrap_or_default();
    let base_includes = paths(config.include_dirs);

    let mut targets = Vec::with_capacity(config.targets.len());
    for target in config.targets {
        let lib_names = unique_list(
            base_libs
                .iter()
                .chain(target.libraries.iter().flatten())
                .cloned(),
        );
        let resolved_libs = lib_names
            .into_iter()
            .map(|name| {
                all_libraries
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| ManifestError::UnknownLibrary {
                        library: name.clone(),
                        target: target.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let flags = format!("{} {}", base_flags, target.flags.unwrap_or_default())
            .trim()
            .to_string();

        let mut include_dirs = base_includes.clone();
        include_dirs.extend(paths(target.include_dirs));

        targets.push(Target {
            kind: target.kind.unwrap_or_default(),
            srcs: target.srcs.into_iter().map(PathBuf::from).collect(),
            flags,
            libraries: resolved_libs,
            include_dirs,
            install_to: paths(target.install_to),
            install_includes: paths(target.install_includes),
            test: target.test.unwrap_or(false),
            name: target.name,
        });
    }

    Ok(BuildInfo {
        projectname: config.projectname,
        builddir: PathBuf::from(config.builddir),
        copy: config.copy.unwrap_or_default(),
        targets,
    })
}

fn validate(targets: &[TargetConfig]) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    for target in targets {
        if target.name.trim().is_empty() {
            return Err(ManifestError::EmptyTargetName);
        }
        if target.name.contains(['/', '\\']) || target.name == "." || target.name == ".." {
            return Err(ManifestError::InvalidTargetName(target.name.clone()));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(ManifestError::DuplicateTarget(target.name.clone()));
        }
        if target.srcs.is_empty() {
            return Err(ManifestError::NoSources(target.name.clone()));
        }
    }
    Ok(())
}

/// Relative, no `..`, and naming at least one directory below the root.
pub fn is_project_subdir(path: &Path) -> bool {
    let mut depth = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

fn paths(values: Option<Vec<String>>) -> Vec<PathBuf> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

/// Keep the first occurrence of every element, preserving order.
pub fn unique_list<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library;
    use tempfile::TempDir;

    fn libs() -> Libraries {
        library::parse(
            r#"{
                "m": { "link_libs": ["m"] },
                "pthread": { "find_package": ["Threads"], "link_libs": ["Threads::Threads"] }
            }"#,
            "test",
        )
        .unwrap()
    }

    fn config(json: &str) -> BuildInfoConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_merges_project_settings_into_targets() {
        let cfg = config(
            r#"{
                "projectname": "demo",
                "builddir": "build.dir",
                "flags": "-Wall",
                "libraries": ["m"],
                "include_dirs": ["include"],
                "targets": [
                    { "name": "app", "srcs": ["src/*.cpp"], "flags": "-O2",
                      "libraries": ["pthread", "m"], "include_dirs": ["src"] },
                    { "name": "tool", "srcs": ["tool.c"] }
                ]
            }"#,
        );
        let info = resolve(cfg, &libs()).unwrap();

        let app = &info.targets[0];
        assert_eq!(app.flags, "-Wall -O2");
        assert_eq!(
            app.libraries.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["m", "pthread"]
        );
        assert_eq!(
            app.include_dirs,
            vec![PathBuf::from("include"), PathBuf::from("src")]
        );
        assert_eq!(app.kind, TargetType::Executable);

        let tool = &info.targets[1];
        assert_eq!(tool.flags, "-Wall");
        assert_eq!(tool.libraries.len(), 1);
        assert_eq!(info.builddir, PathBuf::from("build.dir"));
    }

    #[test]
    fn test_flags_trimmed_when_absent() {
        let cfg = config(
            r#"{ "projectname": "p", "builddir": "b",
                 "targets": [{ "name": "a", "srcs": ["a.c"] }] }"#,
        );
        let info = resolve(cfg, &libs()).unwrap();
        assert_eq!(info.targets[0].flags, "");
    }

    #[test]
    fn test_library_targets_are_linkable() {
        let cfg = config(
            r#"{ "projectname": "p", "builddir": "b", "targets": [
                { "name": "app", "srcs": ["main.c"], "libraries": ["core"] },
                { "name": "core", "type": "staticlib", "srcs": ["core/*.c"] }
            ] }"#,
        );
        let info = resolve(cfg, &libs()).unwrap();
        assert_eq!(info.targets[0].libraries, vec![Library::local("core")]);
    }

    #[test]
    fn test_unknown_library() {
        let cfg = config(
            r#"{ "projectname": "p", "builddir": "b",
                 "targets": [{ "name": "a", "srcs": ["a.c"], "libraries": ["nope"] }] }"#,
        );
        let err = resolve(cfg, &libs()).unwrap_err();
        assert_eq!(err.to_string(), r#"Unknown library "nope" in target "a""#);
    }

    #[test]
    fn test_duplicate_and_empty_targets() {
        let dup = config(
            r#"{ "projectname": "p", "builddir": "b", "targets": [
                { "name": "a", "srcs": ["a.c"] }, { "name": "a", "srcs": ["b.c"] }
            ] }"#,
        );
        assert!(matches!(
            resolve(dup, &libs()),
            Err(ManifestError::DuplicateTarget(name)) if name == "a"
        ));

        let no_srcs = config(
            r#"{ "projectname": "p", "builddir": "b", "targets": [{ "name": "a", "srcs": [] }] }"#,
        );
        assert!(matches!(resolve(no_srcs, &libs()), Err(ManifestError::NoSources(_))));
    }

    #[test]
    fn test_target_names_must_be_file_names() {
        for name in ["../escape", "sub/dir", "win\\dir", ".", ".."] {
            let cfg = BuildInfoConfig {
                projectname: "p".into(),
                builddir: "b".into(),
                targets: vec![TargetConfig {
                    name: name.into(),
                    srcs: vec!["a.c".into()],
                    ..Default::default()
                }],
                ..Default::default()
            };
            assert!(
                matches!(resolve(cfg, &libs()), Err(ManifestError::InvalidTargetName(n)) if n == name),
                "{name} accepted"
            );
        }
    }

    #[test]
    fn test_builddir_must_stay_inside_project() {
        for builddir in ["..", "../build", "/tmp/build", ".", "", "build/../.."] {
            let cfg = BuildInfoConfig {
                projectname: "p".into(),
                builddir: builddir.into(),
                targets: vec![TargetConfig {
                    name: "a".into(),
                    srcs: vec!["a.c".into()],
                    ..Default::default()
                }],
                ..Default::default()
            };
            let err = resolve(cfg, &libs()).unwrap_err();
            assert!(matches!(err, ManifestError::InvalidBuildDir(_)), "{builddir} accepted");
        }
        assert!(is_project_subdir(Path::new("build.dir")));
        assert!(is_project_subdir(Path::new("./out/debug")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("build.info"), &libs()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build.info");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path, &libs()), Err(ManifestError::Parse(..))));
    }

    #[test]
    fn test_unique_list() {
        assert_eq!(unique_list(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
