//! Cloned working directories.
//!
//! Each clone lands in `<work_root>/forged-<project>-<unix-timestamp>`. The
//! directory is reserved with `create_dir` before cloning, so concurrent or
//! back-to-back runs against the same URL never share a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::common::command::{CommandRunner, Invocation};
use crate::error::ForgeError;
use crate::ui::prelude::*;

const DIR_PREFIX: &str = "forged";
const MAX_RESERVE_ATTEMPTS: i64 = 64;

/// Derive a project name from a repository URL.
///
/// Takes the last path segment (ssh `host:owner/repo` style included) and
/// strips a trailing `.git`.
pub fn project_name(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

fn dir_name(project: &str, timestamp: i64) -> String {
    format!("{DIR_PREFIX}-{project}-{timestamp}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    path: PathBuf,
    project: String,
}

impl WorkingDirectory {
    /// Create a fresh, empty directory for `project` under `root`.
    ///
    /// When the name for `timestamp` is taken the suffix is bumped until a
    /// free one is found. A relative `root` is resolved against the current
    /// directory, so the path stays valid after [`WorkingDirectory::enter`].
    pub fn reserve(root: &Path, project: &str, timestamp: i64) -> Result<Self, ForgeError> {
        let root = std::path::absolute(root).map_err(|source| ForgeError::Workspace {
            path: root.to_path_buf(),
            source,
        })?;
        fs::create_dir_all(&root).map_err(|source| ForgeError::Workspace {
            path: root.clone(),
            source,
        })?;

        for offset in 0..MAX_RESERVE_ATTEMPTS {
            let candidate = root.join(dir_name(project, timestamp + offset));
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    return Ok(Self {
                        path: candidate,
                        project: project.to_string(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(ForgeError::Workspace {
                        path: candidate,
                        source,
                    });
                }
            }
        }

        Err(ForgeError::Workspace {
            path: root.join(dir_name(project, timestamp)),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free directory name"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Make this directory the process working directory.
    pub fn enter(&self) -> Result<(), ForgeError> {
        std::env::set_current_dir(&self.path).map_err(|source| ForgeError::Workspace {
            path: self.path.clone(),
            source,
        })
    }
}

/// Shallow-clones repositories into fresh working directories.
pub struct RepositoryAcquirer<'a> {
    runner: &'a dyn CommandRunner,
    root: PathBuf,
    depth: u32,
    clock: fn() -> i64,
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl<'a> RepositoryAcquirer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: impl Into<PathBuf>, depth: u32) -> Self {
        Self {
            runner,
            root: root.into(),
            depth: depth.max(1),
            clock: unix_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn clone_repo(&self, url: &str) -> Result<WorkingDirectory, ForgeError> {
        let project = project_name(url).ok_or_else(|| ForgeError::InvalidUrl(url.to_string()))?;
        let workdir = WorkingDirectory::reserve(&self.root, &project, (self.clock)())?;

        emit(
            Level::Info,
            "forge.clone.start",
            &format!("Cloning {} → {}", project, workdir.path().display()),
            None,
        );

        let invocation = Invocation::new(
            "git",
            [
                "clone".to_string(),
                format!("--depth={}", self.depth),
                url.to_string(),
                workdir.path().display().to_string(),
            ],
        );

        self.runner
            .run(&invocation)
            .map_err(|source| ForgeError::Clone {
                url: url.to_string(),
                source,
            })?;

        Ok(workdir)
    }
}

/// Every working directory ever created for `project` under `root`.
pub fn forged_dirs(root: &Path, project: &str) -> std::io::Result<Vec<PathBuf>> {
    let prefix = format!("{DIR_PREFIX}-{project}-");
    let mut dirs = Vec::new();

    if !root.exists() {
        return Ok(dirs);
    }

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        let is_timestamp = !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit());
        if is_timestamp && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Delete every working directory of `project`. Returns what was removed.
pub fn remove_forged(root: &Path, project: &str) -> Result<Vec<PathBuf>, ForgeError> {
    let dirs = forged_dirs(root, project).map_err(|source| ForgeError::Workspace {
        path: root.to_path_buf(),
        source,
    })?;

    if dirs.is_empty() {
        return Err(ForgeError::NotForged(project.to_string()));
    }

    for dir in &dirs {
        fs::remove_dir_all(dir).map_err(|source| ForgeError::Workspace {
            path: dir.clone(),
            source,
        })?;
    }

    Ok(dirs)
}
