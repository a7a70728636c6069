//! AUR helpers and the official package manager command lines.

use crate::common::command::Invocation;
use crate::common::tools::ToolPresence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AurHelper {
    Yay,
    Paru,
}

/// Helpers in the order they are preferred. The first entry is the one
/// bootstrapped when none is installed.
pub const HELPER_PRIORITY: [AurHelper; 2] = [AurHelper::Yay, AurHelper::Paru];

impl AurHelper {
    pub fn binary(&self) -> &'static str {
        match self {
            AurHelper::Yay => "yay",
            AurHelper::Paru => "paru",
        }
    }

    pub fn primary() -> Self {
        HELPER_PRIORITY[0]
    }

    pub fn install(&self, package: &str) -> Invocation {
        Invocation::new(self.binary(), ["-S", "--noconfirm", package])
    }

    pub fn upgrade(&self) -> Invocation {
        Invocation::new(self.binary(), ["-Syu", "--noconfirm"])
    }
}

impl std::fmt::Display for AurHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.binary())
    }
}

/// First installed helper in priority order.
pub fn detect_aur_helper(tools: &dyn ToolPresence) -> Option<AurHelper> {
    HELPER_PRIORITY
        .iter()
        .copied()
        .find(|helper| tools.present(helper.binary()))
}

pub mod pacman {
    use crate::common::command::Invocation;

    /// Quiet lookup in the sync databases; succeeds only for official packages.
    pub fn info(package: &str) -> Invocation {
        Invocation::new("pacman", ["-Si", package]).quiet()
    }

    pub fn install(package: &str) -> Invocation {
        Invocation::new("pacman", ["-S", "--noconfirm", package]).privileged()
    }

    pub fn upgrade() -> Invocation {
        Invocation::new("pacman", ["-Syu", "--noconfirm"]).privileged()
    }

    pub fn remove(packages: &[String]) -> Invocation {
        let args = ["-Rns", "--noconfirm"]
            .into_iter()
            .map(String::from)
            .chain(packages.iter().cloned());
        Invocation::new("pacman", args).privileged()
    }
}
