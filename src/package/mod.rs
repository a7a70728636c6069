//! Binary package acquisition through pacman and AUR helpers.
//!
//! # Priority
//!
//! 1. Official repositories via pacman
//! 2. AUR via the first installed helper (yay, then paru)
//! 3. Bootstrap yay from the AUR when no helper is installed

pub mod helper;
pub mod remove;
pub mod resolver;
pub mod upgrade;

pub use remove::remove_packages;
pub use resolver::{PackageResolver, Resolution};
pub use upgrade::UpgradeOrchestrator;
