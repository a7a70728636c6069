use crate::common::command::{CommandRunner, Invocation};
use crate::common::tools::ToolPresence;
use crate::error::ForgeError;
use crate::package::helper::{AurHelper, detect_aur_helper, pacman};
use crate::ui::prelude::*;

/// Result of a full upgrade. `helper` is `None` when no AUR helper is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReport {
    pub helper: Option<AurHelper>,
}

/// System upgrade followed by an AUR upgrade through the installed helper.
pub struct UpgradeOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    tools: &'a dyn ToolPresence,
}

impl<'a> UpgradeOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, tools: &'a dyn ToolPresence) -> Self {
        Self { runner, tools }
    }

    pub fn upgrade(&self) -> Result<UpgradeReport, ForgeError> {
        emit(
            Level::Info,
            "upgrade.start",
            "Upgrading system + AUR...",
            None,
        );

        self.run_step("system", "pacman upgrade", &pacman::upgrade())?;

        let helper = detect_aur_helper(self.tools);
        match helper {
            Some(helper) => {
                let step = format!("{} upgrade", helper.binary());
                self.run_step("AUR", &step, &helper.upgrade())?;
            }
            None => emit(
                Level::Debug,
                "upgrade.aur.skipped",
                "No AUR helper installed, skipping AUR upgrade",
                None,
            ),
        }

        Ok(UpgradeReport { helper })
    }

    fn run_step(
        &self,
        target: &str,
        step: &str,
        invocation: &Invocation,
    ) -> Result<(), ForgeError> {
        self.runner
            .run(invocation)
            .map_err(|source| ForgeError::Step {
                project: target.to_string(),
                step: step.to_string(),
                source,
            })
    }
}
