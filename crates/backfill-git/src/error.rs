// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for backfill-git

use thiserror::Error;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// The git binary could not be started
    #[error("Failed to run `{command}`: {message}")]
    Spawn {
        /// The command line that was attempted
        command: String,
        /// The underlying spawn error
        message: String,
    },

    /// The git binary exited with a non-zero status
    #[error("`{command}` failed with code {code:?}: {}", stderr.trim())]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured stderr (or stdout when stderr was empty)
        stderr: String,
    },

    /// `git add` was called without a path
    #[error("git add requires at least one path")]
    EmptyAddPaths,
}
