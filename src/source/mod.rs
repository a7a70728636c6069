//! Source builds: clone a repository, detect its build system, build it.

pub mod detect;
pub mod strategy;
pub mod workdir;

use crate::common::command::{CommandError, CommandRunner, Invocation};
use crate::common::config::ForgedConfig;
use crate::error::ForgeError;
use crate::ui::prelude::*;

pub use detect::{BuildSystem, detect};
pub use strategy::BuildContext;
pub use workdir::{RepositoryAcquirer, WorkingDirectory, project_name, remove_forged};

/// How a source build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(BuildSystem),
    /// No build system recognised; the operator got a shell in the checkout.
    HandedOff,
}

pub struct SourceForge<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a ForgedConfig,
    clock: Option<fn() -> i64>,
}

impl<'a> SourceForge<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a ForgedConfig) -> Self {
        Self {
            runner,
            config,
            clock: None,
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = Some(clock);
        self
    }

    fn acquirer(&self) -> RepositoryAcquirer<'a> {
        let acquirer = RepositoryAcquirer::new(
            self.runner,
            self.config.work_root(),
            self.config.clone_depth,
        );
        match self.clock {
            Some(clock) => acquirer.with_clock(clock),
            None => acquirer,
        }
    }

    /// Clone `url`, enter the checkout and build it.
    pub fn forge(&self, url: &str) -> Result<BuildOutcome, ForgeError> {
        let workdir = self.acquirer().clone_repo(url)?;
        workdir.enter()?;
        self.build_in(&workdir)
    }

    /// Forge several URLs in order, stopping at the first failure.
    pub fn forge_all(&self, urls: &[String]) -> Result<Vec<BuildOutcome>, ForgeError> {
        urls.iter().map(|url| self.forge(url)).collect()
    }

    /// Detect and run the build strategy for an existing checkout.
    pub fn build_in(&self, workdir: &WorkingDirectory) -> Result<BuildOutcome, ForgeError> {
        let Some(system) = detect(workdir.path()) else {
            self.hand_off(workdir)?;
            return Ok(BuildOutcome::HandedOff);
        };

        emit(
            Level::Info,
            "forge.build.detected",
            &format!("{} detected in {}", system, workdir.project()),
            None,
        );

        let ctx = BuildContext::new(workdir.path(), workdir.project(), self.config);
        system.plan(&ctx).execute(self.runner)?;
        Ok(BuildOutcome::Built(system))
    }

    fn hand_off(&self, workdir: &WorkingDirectory) -> Result<(), ForgeError> {
        emit(
            Level::Warn,
            "forge.build.none",
            "No build system detected, dropping into a shell",
            None,
        );

        let shell = Invocation::new(&self.config.fallback_shell, Vec::<String>::new())
            .in_dir(workdir.path());

        // The shell's exit status belongs to the operator. A shell that never
        // started is still a failure.
        match self.runner.run(&shell) {
            Ok(()) => Ok(()),
            Err(e @ CommandError::Status { .. }) => {
                emit(
                    Level::Debug,
                    "forge.build.shell_exit",
                    &format!("Shell ended: {e}"),
                    None,
                );
                Ok(())
            }
            Err(source @ CommandError::Spawn { .. }) => Err(ForgeError::Step {
                project: workdir.project().to_string(),
                step: self.config.fallback_shell.clone(),
                source,
            }),
        }
    }
}
