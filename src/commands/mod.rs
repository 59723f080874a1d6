//! CLI command handlers
//!
//! Handlers for the flag-driven modes of `build` that are not a plain build:
//! `--init`, `--listtemplates` and `--doctor`.

pub mod doctor;
pub mod init;

use crate::settings::Settings;
use crate::templates;

/// `build --listtemplates`
pub fn list_templates(settings: &Settings) {
    let names = templates::all_templates(&settings.templates_dir());
    println!("Available templates: {}", names.join(" "));
}
