//! Library definitions used to resolve `libraries` entries in `build.info`.
//!
//! A definitions file is a JSON object mapping a library name to the CMake
//! fragments needed to use it:
//!
//! ```json
//! {
//!   "gtk3": {
//!     "pkg_check": ["GTK3 REQUIRED gtk+-3.0"],
//!     "include_dirs": ["${GTK3_INCLUDE_DIRS}"],
//!     "link_dirs": ["${GTK3_LIBRARY_DIRS}"],
//!     "link_libs": ["${GTK3_LIBRARIES}"]
//!   },
//!   "llvm": { "link_libs": "llvm-config --libs" }
//! }
//! ```
//!
//! Every field is either a list of strings or a single string. A string is a
//! shell command; its non-empty stdout lines become the values.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Definitions shipped with the tool. Files in `<data dir>/libs` override these.
const BUILTIN_LIBRARIES: &str = r#"{
    "m": { "link_libs": ["m"] },
    "dl": { "link_libs": ["${CMAKE_DL_LIBS}"] },
    "pthread": {
        "find_package": ["Threads REQUIRED"],
        "link_libs": ["Threads::Threads"]
    },
    "gtest": {
        "find_package": ["GTest REQUIRED"],
        "link_libs": ["GTest::gtest", "GTest::gtest_main"]
    },
    "boost": {
        "find_package": ["Boost REQUIRED"],
        "include_dirs": ["${Boost_INCLUDE_DIRS}"],
        "link_libs": ["${Boost_LIBRARIES}"]
    },
    "sdl2": {
        "find_package": ["SDL2 REQUIRED"],
        "include_dirs": ["${SDL2_INCLUDE_DIRS}"],
        "link_libs": ["${SDL2_LIBRARIES}"]
    },
    "opengl": {
        "find_package": ["OpenGL REQUIRED"],
        "link_libs": ["OpenGL::GL"]
    },
    "gtk3": {
        "pkg_check": ["GTK3 REQUIRED gtk+-3.0"],
        "include_dirs": ["${GTK3_INCLUDE_DIRS}"],
        "link_dirs": ["${GTK3_LIBRARY_DIRS}"],
        "link_libs": ["${GTK3_LIBRARIES}"]
    }
}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub find_package: Vec<String>,
    pub pkg_check: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub link_dirs: Vec<PathBuf>,
    pub link_libs: Vec<String>,
}

impl Library {
    /// A library produced by a `sharedlib`/`staticlib` target of the manifest.
    pub fn local(name: &str) -> Self {
        Self {
            name: name.to_string(),
            find_package: Vec::new(),
            pkg_check: Vec::new(),
            include_dirs: Vec::new(),
            link_dirs: Vec::new(),
            link_libs: vec![name.to_string()],
        }
    }
}

pub type Libraries = BTreeMap<String, Library>;

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Values {
    List(Vec<String>),
    Command(String),
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct LibraryConfig {
    find_package: Option<Values>,
    pkg_check: Option<Values>,
    include_dirs: Option<Values>,
    link_dirs: Option<Values>,
    link_libs: Values,
}

#[derive(Debug)]
pub enum LibraryError {
    /// Definitions file could not be read
    Read(PathBuf, std::io::Error),
    /// Definitions file is not a valid library map
    Parse(String, serde_json::Error),
    /// A value command could not be started
    Spawn { library: String, command: String, source: std::io::Error },
    /// A value command exited unsuccessfully
    Command { library: String, command: String, code: Option<i32> },
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Read(path, e) => {
                write!(f, "Failed to read library file {}: {}", path.display(), e)
            }
            LibraryError::Parse(origin, e) => {
                write!(f, "Invalid library definitions in {}: {}", origin, e)
            }
            LibraryError::Spawn { library, command, source } => write!(
                f,
                "Command for library {} could not be started: {} ({})",
                library, command, source
            ),
            LibraryError::Command { library, command, code } => match code {
                Some(code) => write!(
                    f,
                    "Command for library {} failed with rcode {}: {}",
                    library, code, command
                ),
                None => write!(
                    f,
                    "Command for library {} was terminated by a signal: {}",
                    library, command
                ),
            },
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Read(_, e) => Some(e),
            LibraryError::Parse(_, e) => Some(e),
            LibraryError::Spawn { source, .. } => Some(source),
            LibraryError::Command { .. } => None,
        }
    }
}

/// Load the built-in definitions, then every `*.json` in `libs_dir` (if it
/// exists) in file-name order. Later definitions replace earlier ones.
pub fn load_all(libs_dir: &Path) -> Result<Libraries, LibraryError> {
    let mut libraries = parse(BUILTIN_LIBRARIES, "built-in libraries")?;

    if !libs_dir.is_dir() {
        return Ok(libraries);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(libs_dir)
        .map_err(|e| LibraryError::Read(libs_dir.to_path_buf(), e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        libraries.extend(load(&file)?);
    }
    Ok(libraries)
}

pub fn load(path: &Path) -> Result<Libraries, LibraryError> {
    let content = fs::read_to_string(path).map_err(|e| LibraryError::Read(path.to_path_buf(), e))?;
    parse(&content, &path.display().to_string())
}

pub fn parse(content: &str, origin: &str) -> Result<Libraries, LibraryError> {
    let raw: BTreeMap<String, LibraryConfig> =
        serde_json::from_str(content).map_err(|e| LibraryError::Parse(origin.to_string(), e))?;

    let mut libraries = Libraries::new();
    for (name, fields) in raw {
        let paths = |values: Option<Values>| -> Result<Vec<PathBuf>, LibraryError> {
            Ok(get_values(&name, values)?.into_iter().map(PathBuf::from).collect())
        };
        let library = Library {
            find_package: get_values(&name, fields.find_package)?,
            pkg_check: get_values(&name, fields.pkg_check)?,
            include_dirs: paths(fields.include_dirs)?,
            link_dirs: paths(fields.link_dirs)?,
            link_libs: get_values(&name, Some(fields.link_libs))?,
            name: name.clone(),
        };
        libraries.insert(name, library);
    }
    Ok(libraries)
}

fn get_values(name: &str, values: Option<Values>) -> Result<Vec<String>, LibraryError> {
    match values {
        None => Ok(Vec::new()),
        Some(Values::List(list)) => Ok(list),
        Some(Values::Command(command)) => run_value_command(name, &command),
    }
}

fn run_value_command(name: &str, command: &str) -> Result<Vec<String>, LibraryError> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Resolving library {}...", name.bold()));

    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    };
    pb.finish_and_clear();

    let output = output.map_err(|source| LibraryError::Spawn {
        library: name.to_string(),
        command: command.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(LibraryError::Command {
            library: name.to_string(),
            command: command.to_string(),
            code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
