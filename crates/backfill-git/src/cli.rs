// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Typed wrapper over the `git` binary
//!
//! All writes to the repository go through the `git` CLI. The process is
//! reached through [`CommandExecutor`]; tests substitute a scripted executor.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::commit::CommitRequest;
use crate::error::GitError;

/// Captured output of a successful git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

/// Raw result of running a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if any
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

/// Runs a program to completion and captures its output
pub trait CommandExecutor {
    /// Run `program` with `args` in `cwd`, adding `envs` to that process only
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the process cannot be spawned.
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandResult, std::io::Error>;
}

/// Executor backed by [`std::process::Command`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandResult, std::io::Error> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// One line of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staged) status column
    pub index: char,
    /// Working tree status column
    pub worktree: char,
    /// Path as reported by git
    pub path: String,
}

impl StatusEntry {
    /// Parse a single porcelain v1 line
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut chars = line.chars();
        let index = chars.next()?;
        let worktree = chars.next()?;
        let path = line.get(3..)?.to_string();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            index,
            worktree,
            path,
        })
    }

    /// Whether this entry has changes recorded in the index
    #[must_use]
    pub fn is_staged(&self) -> bool {
        !matches!(self.index, ' ' | '?' | '!')
    }
}

/// Parse the full output of `git status --porcelain`
#[must_use]
pub fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    output.lines().filter_map(StatusEntry::parse).collect()
}

/// A git working tree driven through the CLI
#[derive(Debug, Clone)]
pub struct GitCli<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
}

impl GitCli<ProcessCommandExecutor> {
    /// Drive the working tree at `repo_path` with the real `git` binary
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            executor: ProcessCommandExecutor,
        }
    }
}

impl<E: CommandExecutor> GitCli<E> {
    /// Drive the working tree at `repo_path` with a custom executor
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self {
            repo_path: repo_path.into(),
            executor,
        }
    }

    /// The working tree root
    #[must_use]
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `git init`
    ///
    /// # Errors
    ///
    /// Returns `GitError` if git cannot be run or exits non-zero.
    pub fn init(&self) -> Result<GitCommandOutput, GitError> {
        self.run(&["init"], &[])
    }

    /// `git config <key> <value>` (repository-local)
    ///
    /// # Errors
    ///
    /// Returns `GitError` if git cannot be run or exits non-zero.
    pub fn config(&self, key: &str, value: &str) -> Result<GitCommandOutput, GitError> {
        self.run(&["config", key, value], &[])
    }

    /// `git add -- <paths>`
    ///
    /// # Errors
    ///
    /// Returns `GitError::EmptyAddPaths` for an empty slice, otherwise any
    /// failure of the git invocation.
    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<GitCommandOutput, GitError> {
        if paths.is_empty() {
            return Err(GitError::EmptyAddPaths);
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(|path| path.as_ref()));
        self.run(&args, &[])
    }

    /// `git status --porcelain`, parsed
    ///
    /// # Errors
    ///
    /// Returns `GitError` if git cannot be run or exits non-zero.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>, GitError> {
        let output = self.run(&["status", "--porcelain"], &[])?;
        Ok(parse_porcelain(&output.stdout))
    }

    /// Whether the index differs from HEAD
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the status cannot be read.
    pub fn has_staged_changes(&self) -> Result<bool, GitError> {
        Ok(self.status_porcelain()?.iter().any(StatusEntry::is_staged))
    }

    /// `git commit -m <message>` with identity and dates forced through the
    /// environment of this single invocation
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` with git's stderr when the commit is
    /// rejected.
    pub fn commit(&self, request: &CommitRequest<'_>) -> Result<GitCommandOutput, GitError> {
        self.run(&["commit", "-m", request.message], &request.env())
    }

    /// Like [`GitCli::commit`] but allows a commit with no changes
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the commit is rejected.
    pub fn commit_allow_empty(
        &self,
        request: &CommitRequest<'_>,
    ) -> Result<GitCommandOutput, GitError> {
        self.run(
            &["commit", "--allow-empty", "-m", request.message],
            &request.env(),
        )
    }

    /// `git branch -M <name>`
    ///
    /// # Errors
    ///
    /// Returns `GitError` if git cannot be run or exits non-zero.
    pub fn rename_branch(&self, name: &str) -> Result<GitCommandOutput, GitError> {
        self.run(&["branch", "-M", name], &[])
    }

    /// SHA of the current HEAD commit
    ///
    /// # Errors
    ///
    /// Returns `GitError` if HEAD does not resolve.
    pub fn rev_parse_head(&self) -> Result<String, GitError> {
        let output = self.run(&["rev-parse", "HEAD"], &[])?;
        Ok(output.stdout.trim().to_string())
    }

    fn run(&self, args: &[&str], envs: &[(String, String)]) -> Result<GitCommandOutput, GitError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        let command = format!("git {}", args.join(" "));
        debug!(%command, "running git");

        let result = self
            .executor
            .execute("git", &args, &self.repo_path, envs)
            .map_err(|error| GitError::Spawn {
                command: command.clone(),
                message: error.to_string(),
            })?;

        if result.success {
            return Ok(GitCommandOutput {
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        let stderr = if result.stderr.trim().is_empty() {
            result.stdout
        } else {
            result.stderr
        };

        Err(GitError::CommandFailed {
            command,
            code: result.code,
            stderr,
        })
    }
}
