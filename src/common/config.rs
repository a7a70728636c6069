//! User configuration (`~/.config/forged/config.toml`).
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! privilege_wrapper = "doas"
//! clone_depth = 1
//! work_root = "/var/tmp"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgedConfig {
    /// Program used for steps that need root (pacman -S, make install, ...)
    pub privilege_wrapper: String,
    /// Where cloned repositories are placed. Defaults to the system temp dir.
    pub work_root: Option<PathBuf>,
    /// `git clone --depth` value
    pub clone_depth: u32,
    /// Install prefix handed to meson, cmake and configure
    pub install_prefix: String,
    /// Destination for binaries built from Go modules
    pub go_bin_dir: String,
    /// Shell opened when no build system is recognised
    pub fallback_shell: String,
    /// AUR base URL; helper recipes are cloned from `<aur_base_url>/<helper>.git`
    pub aur_base_url: String,
}

impl Default for ForgedConfig {
    fn default() -> Self {
        Self {
            privilege_wrapper: Self::DEFAULT_PRIVILEGE_WRAPPER.to_string(),
            work_root: None,
            clone_depth: Self::DEFAULT_CLONE_DEPTH,
            install_prefix: Self::DEFAULT_INSTALL_PREFIX.to_string(),
            go_bin_dir: Self::DEFAULT_GO_BIN_DIR.to_string(),
            fallback_shell: Self::DEFAULT_FALLBACK_SHELL.to_string(),
            aur_base_url: Self::DEFAULT_AUR_BASE_URL.to_string(),
        }
    }
}

impl ForgedConfig {
    pub const DEFAULT_PRIVILEGE_WRAPPER: &'static str = "sudo";
    pub const DEFAULT_CLONE_DEPTH: u32 = 1;
    pub const DEFAULT_INSTALL_PREFIX: &'static str = "/usr";
    pub const DEFAULT_GO_BIN_DIR: &'static str = "/usr/local/bin";
    pub const DEFAULT_FALLBACK_SHELL: &'static str = "bash";
    pub const DEFAULT_AUR_BASE_URL: &'static str = "https://aur.archlinux.org";

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => paths::default_config_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.clone_depth == 0 {
            anyhow::bail!("clone_depth must be at least 1");
        }
        Ok(config)
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_root
            .clone()
            .unwrap_or_else(paths::default_work_root)
    }

    /// Clone URL of the build recipe for an AUR helper.
    pub fn helper_recipe_url(&self, helper: &str) -> String {
        format!("{}/{}.git", self.aur_base_url.trim_end_matches('/'), helper)
    }
}
