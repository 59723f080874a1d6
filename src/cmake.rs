//! `CMakeLists.txt` generation from a resolved [`BuildInfo`].

use crate::config::TargetType;
use crate::library::Library;
use crate::manifest::{BuildInfo, Target, unique_list};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CMAKELISTS: &str = "CMakeLists.txt";

const CMAKE_MINIMUM: &str = "cmake_minimum_required(VERSION 3.10 FATAL_ERROR)";

/// Render the complete file contents, newline terminated.
pub fn render(info: &BuildInfo) -> String {
    let mut lines: Vec<String> = vec![
        CMAKE_MINIMUM.to_string(),
        String::new(),
        format!("project({})", info.projectname),
    ];

    let libraries = used_libraries(info);
    let find_packs: Vec<&String> = libraries.iter().flat_map(|l| &l.find_package).collect();
    let pkg_checks: Vec<&String> = libraries.iter().flat_map(|l| &l.pkg_check).collect();
    let link_dirs: Vec<&PathBuf> = libraries.iter().flat_map(|l| &l.link_dirs).collect();

    if !find_packs.is_empty() {
        lines.push(String::new());
        for pack in find_packs {
            lines.push(format!("find_package({})", pack));
        }
    }

    if !pkg_checks.is_empty() {
        lines.push(String::new());
        lines.push("INCLUDE(FindPkgConfig)".to_string());
        lines.push(String::new());
        for check in pkg_checks {
            lines.push(format!("pkg_check_modules({})", check));
        }
    }

    if !link_dirs.is_empty() {
        lines.push(format!("link_directories({})", join_paths(link_dirs)));
    }

    if info.has_tests() {
        lines.push(String::new());
        lines.push("enable_testing()".to_string());
    }

    for target in &info.targets {
        lines.push(String::new());
        render_target(target, &mut lines);
    }

    lines.push(String::new());
    render_installs(info, &mut lines);

    lines.extend(info.copy.iter().cloned());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write the rendered file into `project_dir`.
pub fn write(info: &BuildInfo, project_dir: &Path) -> Result<PathBuf> {
    let path = project_dir.join(CMAKELISTS);
    fs::write(&path, render(info))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn render_target(target: &Target, lines: &mut Vec<String>) {
    let name = &target.name;
    let files_var = format!("SRC_FILES_{}", name);
    let srcs: Vec<&PathBuf> = target.srcs.iter().collect();

    lines.push(format!("file(GLOB_RECURSE {} {})", files_var, join_paths(srcs)));
    lines.push(match target.kind {
        TargetType::Executable => format!("add_executable({} ${{{}}})", name, files_var),
        TargetType::Sharedlib => format!("add_library({} SHARED ${{{}}})", name, files_var),
        TargetType::Staticlib => format!("add_library({} STATIC ${{{}}})", name, files_var),
    });

    if !target.flags.is_empty() {
        lines.push(format!(
            "target_compile_options({} PRIVATE {})",
            name, target.flags
        ));
    }

    let include_dirs: Vec<&PathBuf> = target
        .include_dirs
        .iter()
        .chain(target.libraries.iter().flat_map(|l| &l.include_dirs))
        .collect();
    if !include_dirs.is_empty() {
        lines.push(format!(
            "target_include_directories({} PRIVATE {})",
            name,
            join_paths(include_dirs)
        ));
    }

    let link_libs: Vec<&str> = target
        .libraries
        .iter()
        .flat_map(|l| l.link_libs.iter().map(String::as_str))
        .collect();
    if !link_libs.is_empty() {
        lines.push(format!(
            "target_link_libraries({} {})",
            name,
            link_libs.join(" ")
        ));
    }

    if target.test {
        lines.push(format!("add_test(NAME {} COMMAND {})", name, name));
    }
}

fn render_installs(info: &BuildInfo, lines: &mut Vec<String>) {
    let mut include_files = Vec::new();
    let mut include_patterns = Vec::new();

    for target in &info.targets {
        let install_type = match target.kind {
            TargetType::Executable => "RUNTIME",
            TargetType::Sharedlib => "LIBRARY",
            TargetType::Staticlib => "ARCHIVE",
        };
        for dest in &target.install_to {
            lines.push(format!(
                "install(TARGETS {} {} DESTINATION {})",
                target.name,
                install_type,
                dest.display()
            ));
        }

        for include in &target.install_includes {
            if include.to_string_lossy().contains('*') {
                include_patterns.push(include);
            } else {
                include_files.push(include);
            }
        }
    }

    if !include_files.is_empty() {
        lines.push(format!(
            "install(FILES {} DESTINATION include)",
            join_paths(include_files)
        ));
    }
    for pattern in include_patterns {
        let parent = pattern
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_pattern = pattern
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        lines.push(format!(
            "install(DIRECTORY {} DESTINATION include FILES_MATCHING PATTERN \"{}\")",
            cmake_path(parent),
            file_pattern
        ));
    }
}

/// Libraries used by any target, first use wins.
fn used_libraries(info: &BuildInfo) -> Vec<&Library> {
    let names = unique_list(
        info.targets
            .iter()
            .flat_map(|t| t.libraries.iter().map(|l| l.name.as_str())),
    );
    names
        .into_iter()
        .filter_map(|name| {
            info.targets
                .iter()
                .flat_map(|t| &t.libraries)
                .find(|l| l.name == name)
        })
        .collect()
}

fn join_paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> String {
    paths
        .into_iter()
        .map(|p| cmake_path(p))
        .collect::<Vec<_>>()
        .join(" ")
}

/// CMake wants forward slashes on every platform.
fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
