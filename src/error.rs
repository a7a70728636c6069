use std::path::PathBuf;

use thiserror::Error;

use crate::common::command::CommandError;

/// Which tier of package resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Official,
    Aur,
}

impl std::fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionTier::Official => write!(f, "official repos"),
            ResolutionTier::Aur => write!(f, "AUR"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("failed to install {package} from {tier}")]
    Resolution {
        package: String,
        tier: ResolutionTier,
        #[source]
        source: CommandError,
    },

    #[error("failed to remove {}", packages.join(" "))]
    Removal {
        packages: Vec<String>,
        #[source]
        source: CommandError,
    },

    #[error("{step} failed while bootstrapping {helper}")]
    Bootstrap {
        helper: String,
        step: String,
        #[source]
        source: CommandError,
    },

    #[error("git clone failed for {url}")]
    Clone {
        url: String,
        #[source]
        source: CommandError,
    },

    #[error("{step} failed for {project}")]
    Step {
        project: String,
        step: String,
        #[source]
        source: CommandError,
    },

    #[error("invalid package name '{0}'")]
    InvalidPackage(String),

    #[error("cannot derive a project name from '{0}'")]
    InvalidUrl(String),

    #[error("working directory {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("nothing forged for {0}")]
    NotForged(String),
}

impl ForgeError {
    /// Name of the failing step, when the failure happened inside a build strategy.
    pub fn step(&self) -> Option<&str> {
        match self {
            ForgeError::Step { step, .. } | ForgeError::Bootstrap { step, .. } => Some(step),
            _ => None,
        }
    }
}
