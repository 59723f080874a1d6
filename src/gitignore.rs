//! Maintains a generated block inside `.gitignore`.
//!
//! Lines the user wrote outside the block are kept; the block itself is
//! rewritten from the manifest on every regeneration.

use crate::manifest::BuildInfo;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const GITIGNORE: &str = ".gitignore";
pub const START_LINE: &str = "#-- Generated by build --#";
pub const END_LINE: &str = "#-- End generated by build --#";

/// Lines of the generated block, markers included.
pub fn generated_block(info: &BuildInfo) -> Vec<String> {
    let builddir = info.builddir.to_string_lossy().replace('\\', "/");
    let builddir = builddir.trim_start_matches("./").trim_end_matches('/');

    let mut lines: Vec<String> = vec![
        START_LINE.to_string(),
        "# Build dir".to_string(),
        format!("/{}", builddir),
        String::new(),
        "# Vim swap files".to_string(),
        "*.swp".to_string(),
        "*.swo".to_string(),
        String::new(),
        "# Object files".to_string(),
        "*.o".to_string(),
        String::new(),
        "# Libraries".to_string(),
        "*.a".to_string(),
        "*.so".to_string(),
    ];

    if info.has_installs() {
        lines.push(String::new());
        lines.push("# Install manifest".to_string());
        lines.push("/install_manifest.txt".to_string());
    }

    let executables: Vec<String> = info.executables().map(|t| format!("/{}", t.name)).collect();
    if !executables.is_empty() {
        lines.push(String::new());
        lines.push("# Executables".to_string());
        lines.extend(executables);
    }

    lines.push(String::new());
    lines.push(END_LINE.to_string());
    lines
}

/// Merge the generated block into `existing` file contents (if any).
///
/// User lines found before and after a previous block end up above the new
/// block, separated from it by exactly one empty line.
pub fn merge(existing: Option<&str>, block: &[String]) -> String {
    let mut extra: Vec<&str> = Vec::new();

    if let Some(existing) = existing {
        let lines: Vec<&str> = existing.split('\n').collect();
        let start = lines.iter().position(|l| *l == START_LINE);
        let end = lines.iter().position(|l| *l == END_LINE);

        match (start, end) {
            (None, None) => extra.extend(&lines),
            (start, end) => {
                if let Some(start) = start {
                    extra.extend(&lines[..start]);
                }
                if let Some(end) = end {
                    extra.extend(&lines[end + 1..]);
                }
            }
        }
    }

    while extra.last().is_some_and(|l| l.trim().is_empty()) {
        extra.pop();
    }
    if !extra.is_empty() {
        extra.push("");
    }

    let mut out: Vec<&str> = extra;
    out.extend(block.iter().map(String::as_str));
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Rewrite `<project_dir>/.gitignore`.
pub fn write(info: &BuildInfo, project_dir: &Path) -> Result<PathBuf> {
    let path = project_dir.join(GITIGNORE);
    let existing = if path.exists() {
        Some(
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        )
    } else {
        None
    };

    let merged = merge(existing.as_deref(), &generated_block(info));
    fs::write(&path, merged).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
