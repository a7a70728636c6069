//! External command execution.
//!
//! Every pipeline talks to the outside world through [`CommandRunner`], so the
//! resolution and build logic can be exercised with a recording runner instead
//! of spawning pacman, makepkg or cmake.

use std::fmt;
use std::path::{Path, PathBuf};

use duct::cmd;
use thiserror::Error;

use crate::ui::prelude::*;

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory of the child. `None` inherits ours.
    pub dir: Option<PathBuf>,
    /// Run through the privilege wrapper (sudo).
    pub privileged: bool,
    /// Discard stdout/stderr. Used for probes like `pacman -Si`.
    pub quiet: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
            privileged: false,
            quiet: false,
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Program followed by its arguments, without the privilege wrapper.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.privileged {
            write!(f, "[privileged] ")?;
        }
        write!(f, "{}", self.command_line())
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}", describe_code(.code))]
    Status { program: String, code: Option<i32> },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs one external program to completion.
///
/// Implementations block until the child exits. There is no timeout.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError>;
}

/// Spawns real processes, inheriting the terminal so interactive prompts work.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    privilege_wrapper: String,
}

impl SystemRunner {
    pub fn new(privilege_wrapper: impl Into<String>) -> Self {
        Self {
            privilege_wrapper: privilege_wrapper.into(),
        }
    }

    /// Resolve the program and argument list actually handed to the OS.
    fn argv(&self, invocation: &Invocation) -> (String, Vec<String>) {
        let already_root = matches!(sudo::check(), sudo::RunningAs::Root);
        if invocation.privileged && !already_root {
            let mut args = Vec::with_capacity(invocation.args.len() + 1);
            args.push(invocation.program.clone());
            args.extend(invocation.args.iter().cloned());
            (self.privilege_wrapper.clone(), args)
        } else {
            (invocation.program.clone(), invocation.args.clone())
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        let (program, args) = self.argv(invocation);

        if is_debug_enabled() {
            emit(
                Level::Debug,
                "command.run",
                &format!("$ {} {}", program, args.join(" ")),
                None,
            );
        }

        let mut expression = cmd(program.as_str(), &args).unchecked();
        if let Some(dir) = &invocation.dir {
            expression = expression.dir(dir);
        }
        if invocation.quiet {
            expression = expression.stdout_null().stderr_null();
        }

        let output = expression.run().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Status {
                program,
                code: output.status.code(),
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_excludes_wrapper() {
        let invocation = Invocation::new("pacman", ["-S", "--noconfirm", "htop"]).privileged();
        assert_eq!(invocation.command_line(), "pacman -S --noconfirm htop");
        assert_eq!(invocation.to_string(), "[privileged] pacman -S --noconfirm htop");
    }

    #[test]
    fn test_builder_flags() {
        let invocation = Invocation::new("pacman", ["-Si", "htop"])
            .quiet()
            .in_dir("/tmp");
        assert!(invocation.quiet);
        assert!(!invocation.privileged);
        assert_eq!(invocation.dir.as_deref(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_privileged_argv_prefixes_wrapper() {
        if matches!(sudo::check(), sudo::RunningAs::Root) {
            return;
        }
        let runner = SystemRunner::new("doas");
        let (program, args) = runner.argv(&Invocation::new("make", ["install"]).privileged());
        assert_eq!(program, "doas");
        assert_eq!(args, vec!["make", "install"]);
    }

    #[test]
    fn test_unprivileged_argv_is_untouched() {
        let runner = SystemRunner::new("sudo");
        let (program, args) = runner.argv(&Invocation::new("ninja", ["-C", "build"]));
        assert_eq!(program, "ninja");
        assert_eq!(args, vec!["-C", "build"]);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let runner = SystemRunner::new("sudo");
        let err = runner
            .run(&Invocation::new("forged-definitely-missing-binary", Vec::<String>::new()).quiet())
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_status_error_message() {
        let err = CommandError::Status {
            program: "cmake".to_string(),
            code: Some(2),
        };
        assert_eq!(err.to_string(), "cmake exited with status 2");
    }
}
