// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! backfill-git: git plumbing for backfill
//!
//! Writes go through the `git` binary ([`GitCli`]); history is read back with
//! `git2` ([`HistoryReader`]).

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use backfill_git::{GitCli, HistoryReader, WalkOptions};
//!
//! let git = GitCli::new(".");
//! println!("staged changes: {}", git.has_staged_changes().expect("status"));
//!
//! let reader = HistoryReader::open(".").expect("open repo");
//! for c in reader.walk_commits(&WalkOptions::latest(10)).expect("walk commits") {
//!     println!("{} {} - {}", c.short_sha(), c.author, c.subject());
//! }
//! ```

pub mod cli;
pub mod commit;
pub mod error;
pub mod history;

pub use cli::{CommandExecutor, CommandResult, GitCli, GitCommandOutput, ProcessCommandExecutor};
pub use commit::{Commit, CommitRequest, Signature, format_git_date};
pub use error::GitError;
pub use history::{AuditFlag, AuditOptions, AuthorCount, CommitAudit, HistoryReader, WalkOptions};
