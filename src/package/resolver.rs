//! Tiered package resolution.
//!
//! 1. Official repositories (`pacman -Si` then `pacman -S`). A failed install
//!    here is final; the AUR is not tried.
//! 2. Otherwise the first installed AUR helper. When there is none, the
//!    primary helper is bootstrapped from its AUR recipe first.
//! 3. Install through the helper.

use crate::common::command::CommandRunner;
use crate::common::config::ForgedConfig;
use crate::common::tools::ToolPresence;
use crate::error::{ForgeError, ResolutionTier};
use crate::package::helper::{AurHelper, detect_aur_helper, pacman};
use crate::source::detect::BuildSystem;
use crate::source::strategy::BuildContext;
use crate::source::workdir::RepositoryAcquirer;
use crate::ui::prelude::*;

/// Where a package ended up coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Official,
    Aur {
        helper: AurHelper,
        bootstrapped: bool,
    },
}

pub struct PackageResolver<'a> {
    runner: &'a dyn CommandRunner,
    tools: &'a dyn ToolPresence,
    config: &'a ForgedConfig,
}

impl<'a> PackageResolver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        tools: &'a dyn ToolPresence,
        config: &'a ForgedConfig,
    ) -> Self {
        Self {
            runner,
            tools,
            config,
        }
    }

    pub fn resolve(&self, package: &str) -> Result<Resolution, ForgeError> {
        let package = package.trim();
        if package.is_empty() {
            return Err(ForgeError::InvalidPackage(package.to_string()));
        }

        emit(
            Level::Info,
            "package.install.start",
            &format!("Installing {package}..."),
            None,
        );

        if self.runner.run(&pacman::info(package)).is_ok() {
            self.runner
                .run(&pacman::install(package))
                .map_err(|source| ForgeError::Resolution {
                    package: package.to_string(),
                    tier: ResolutionTier::Official,
                    source,
                })?;
            return Ok(Resolution::Official);
        }

        emit(
            Level::Debug,
            "package.install.not_official",
            &format!("{package} is not in the official repositories"),
            None,
        );

        let (helper, bootstrapped) = match detect_aur_helper(self.tools) {
            Some(helper) => (helper, false),
            None => {
                let helper = AurHelper::primary();
                emit(
                    Level::Warn,
                    "package.helper.bootstrap",
                    &format!("Installing {helper} first..."),
                    None,
                );
                self.bootstrap(helper)?;
                (helper, true)
            }
        };

        self.runner
            .run(&helper.install(package))
            .map_err(|source| ForgeError::Resolution {
                package: package.to_string(),
                tier: ResolutionTier::Aur,
                source,
            })?;

        Ok(Resolution::Aur {
            helper,
            bootstrapped,
        })
    }

    /// Clone the helper's AUR recipe and build it with makepkg.
    ///
    /// The native package strategy is used directly and never goes through
    /// [`PackageResolver::resolve`], so a bootstrap cannot require another
    /// bootstrap.
    fn bootstrap(&self, helper: AurHelper) -> Result<(), ForgeError> {
        let acquirer = RepositoryAcquirer::new(
            self.runner,
            self.config.work_root(),
            self.config.clone_depth,
        );
        let url = self.config.helper_recipe_url(helper.binary());

        let workdir = acquirer.clone_repo(&url).map_err(|e| match e {
            ForgeError::Clone { source, .. } => ForgeError::Bootstrap {
                helper: helper.to_string(),
                step: "git clone".to_string(),
                source,
            },
            other => other,
        })?;

        let ctx = BuildContext::new(workdir.path(), helper.binary(), self.config);
        BuildSystem::Pkgbuild
            .plan(&ctx)
            .execute(self.runner)
            .map_err(|e| match e {
                ForgeError::Step { step, source, .. } => ForgeError::Bootstrap {
                    helper: helper.to_string(),
                    step,
                    source,
                },
                other => other,
            })
    }
}
