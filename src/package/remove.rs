use crate::common::command::CommandRunner;
use crate::error::ForgeError;
use crate::package::helper::pacman;
use crate::ui::prelude::*;

/// Remove packages together with their unneeded dependencies (`pacman -Rns`).
pub fn remove_packages(runner: &dyn CommandRunner, packages: &[String]) -> Result<(), ForgeError> {
    if let Some(bad) = packages.iter().find(|p| p.trim().is_empty()) {
        return Err(ForgeError::InvalidPackage(bad.clone()));
    }

    emit(
        Level::Info,
        "package.remove.start",
        &format!("Removing {}...", packages.join(" ")),
        None,
    );

    runner
        .run(&pacman::remove(packages))
        .map_err(|source| ForgeError::Removal {
            packages: packages.to_vec(),
            source,
        })
}
