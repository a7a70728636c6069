use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Isolated config + work root for one test.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let env = Self {
            temp_dir: tempfile::tempdir()?,
        };
        std::fs::create_dir_all(env.work_root())?;
        env.write_config(&format!(
            "work_root = \"{}\"\n",
            env.work_root().display()
        ))?;
        Ok(env)
    }

    pub fn work_root(&self) -> PathBuf {
        self.temp_dir.path().join("work")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.toml")
    }

    pub fn write_config(&self, contents: &str) -> Result<()> {
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    /// Create a directory that looks like a previous clone of `project`.
    pub fn fake_checkout(&self, project: &str, timestamp: u64) -> Result<PathBuf> {
        let dir = self.work_root().join(format!("forged-{project}-{timestamp}"));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Run the forged binary with this environment's config.
pub fn run_forged_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    run_forged(Some(&env.config_path()), args)
}

pub fn run_forged(config: Option<&Path>, args: &[&str]) -> Result<CommandOutput> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_forged"));
    cmd.args(args).arg("--no-color");
    if let Some(config) = config {
        cmd.arg("--config").arg(config);
    }

    let output = cmd.output()?;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
