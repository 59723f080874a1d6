//! Doctor command handler
//!
//! Handles `build --doctor`: which external tools are reachable and what
//! state the current project is in.

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::build::{self, BuildOptions, process};
use crate::cmake::CMAKELISTS;
use crate::settings::Settings;
use crate::templates;
use crate::ui;

/// Tools the wrapper shells out to, with a hint shown when missing.
const TOOLS: &[(&str, &str)] = &[
    ("git", "Install Git"),
    ("cmake", "Install CMake"),
    ("make", "Install GNU Make"),
    ("ctest", "Ships with CMake"),
];

pub fn run_doctor(project_dir: &Path, options: &BuildOptions, settings: &Settings) -> Result<()> {
    println!("{} Running System Doctor...", "🚑".red());
    println!("-------------------------------");
    println!(
        "{}: {} ({})",
        "System".bold(),
        std::env::consts::OS.green(),
        std::env::consts::ARCH.cyan()
    );
    println!("{}: {}", "Data dir".bold(), settings.data_dir().display());
    println!(
        "{}: {}",
        "Templates".bold(),
        templates::all_templates(&settings.templates_dir()).join(", ")
    );

    println!("\n{}", "Build Tools:".bold());
    let mut table = ui::Table::new(&["Status", "Tool", "Version"]);
    let mut missing = 0;
    for (tool, hint) in TOOLS {
        let row = match process::tool_version(tool) {
            Some(version) => vec!["✓".green().to_string(), tool.to_string(), version],
            None => {
                missing += 1;
                vec![
                    "x".red().to_string(),
                    tool.to_string(),
                    format!("Not Found ({})", hint).dimmed().to_string(),
                ]
            }
        };
        table.add_row(row);
    }
    table.print();

    println!("\n{}", "Project:".bold());
    let buildfile = project_dir.join(&options.buildfile);
    match build::load_project(project_dir, &options.buildfile, settings) {
        Ok(info) => {
            ui::success(&format!(
                "{} is valid: {} ({} targets)",
                options.buildfile.display(),
                info.projectname.bold(),
                info.targets.len()
            ));
            let cmakelists = project_dir.join(CMAKELISTS);
            if build::needs_regeneration(&buildfile, &cmakelists)? {
                ui::warn(&format!("{} will be regenerated on the next build", CMAKELISTS));
            } else {
                ui::success(&format!("{} is up to date", CMAKELISTS));
            }
            if project_dir
                .join(&info.builddir)
                .join("CMakeCache.txt")
                .exists()
            {
                ui::success("Build directory is configured");
            } else {
                ui::warn("Build directory is not configured yet");
            }
        }
        Err(e) => println!("{} {}", "x".red(), e),
    }

    if missing > 0 {
        println!();
        ui::warn(&format!("{} tool(s) missing from PATH", missing));
    }
    Ok(())
}
