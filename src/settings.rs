//! User settings (`settings.toml`) and data directory lookup.
//!
//! ```toml
//! data_dir = "/home/me/.local/share/cmbuild"
//! default_template = "c"
//! git = true
//! make_jobs = 8
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "cmbuild";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const DATA_DIR_ENV: &str = "CMBUILD_DATA_DIR";
pub const CONFIG_DIR_ENV: &str = "CMBUILD_CONFIG_DIR";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub default_template: Option<String>,
    /// Run `git init` for projects outside a repository.
    pub git: Option<bool>,
    /// Passed to make as `-jN` unless the arguments already choose a job count.
    pub make_jobs: Option<u32>,
}

impl Settings {
    /// Load from the user config dir. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match config_dir() {
            Some(dir) => Self::load_from(&dir.join(SETTINGS_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Root holding `templates/` and `libs/`.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir().join("templates")
    }

    pub fn libs_dir(&self) -> PathBuf {
        self.data_dir().join("libs")
    }

    pub fn default_template(&self) -> &str {
        self.default_template.as_deref().unwrap_or("default")
    }

    pub fn git_enabled(&self) -> bool {
        self.git.unwrap_or(true)
    }
}

fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_DIR))
}
