//! Centralized path management for forged

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory holding `config.toml`
pub fn forged_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("forged");
    Ok(config_dir)
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(forged_config_dir()?.join("config.toml"))
}

/// Shared temporary-files area that holds cloned working directories
pub fn default_work_root() -> PathBuf {
    std::env::temp_dir()
}
