//! Persistent CLI settings.
//!
//! # Responsibility
//! - Locate, load, and save `settings.json` (`{"save_dir": ...}`).
//! - Derive the notes root and default log directory from `save_dir`.
//!
//! # Invariants
//! - Loading never fails: a missing or malformed file yields defaults.
//! - `save_dir` handed to the core is always absolute.

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "Journa";
pub const SETTINGS_FILE: &str = "settings.json";
pub const CONFIG_ENV: &str = "JOURNA_CONFIG";
/// Notes root directory under `save_dir`.
pub const TRUNKS_DIR: &str = "Trunks";
const LOGS_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub save_dir: PathBuf,
}

impl Settings {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Root of the Trunk > Journal > Note tree.
    pub fn root(&self) -> PathBuf {
        self.save_dir.join(TRUNKS_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.save_dir.join(LOGS_DIR)
    }
}

/// Default `save_dir`: the platform data directory plus `Journa`.
pub fn default_save_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("could not determine the platform data directory"))
}

/// Picks the settings file: explicit flag, then `JOURNA_CONFIG`, then the
/// platform default.
pub fn resolve_settings_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    let env = std::env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    match flag.or(env) {
        Some(path) => absolutize(&path),
        None => Ok(default_save_dir()?.join(SETTINGS_FILE)),
    }
}

/// Loads settings from `path`, falling back to `default_save_dir`.
pub fn load(path: &Path, default_save_dir: &Path) -> Settings {
    let fallback = || Settings::new(default_save_dir);
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return fallback(),
        Err(err) => {
            warn!(
                "event=settings_load module=cli status=error path={} error={err}",
                path.display()
            );
            return fallback();
        }
    };
    match serde_json::from_str::<Settings>(&content) {
        Ok(settings) if !settings.save_dir.as_os_str().is_empty() => settings,
        Ok(_) => fallback(),
        Err(err) => {
            warn!(
                "event=settings_load module=cli status=error reason=malformed path={} error={err}",
                path.display()
            );
            fallback()
        }
    }
}

/// Writes settings pretty-printed, creating parent directories.
pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Resolves relative paths against the working directory.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(path))
}
