// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit identity, backdating and read-back types

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Format accepted by `GIT_AUTHOR_DATE` / `GIT_COMMITTER_DATE`.
///
/// `%z` renders the offset without a colon (`+0000`), which is the form git
/// parses unambiguously.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Render a timestamp in git's native date format
#[must_use]
pub fn format_git_date(when: &DateTime<FixedOffset>) -> String {
    when.format(GIT_DATE_FORMAT).to_string()
}

/// Name and email recorded as both author and committer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl Signature {
    /// Create a new signature
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A single backdated commit to be created by `git commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest<'a> {
    /// Commit message
    pub message: &'a str,
    /// Identity forced onto both author and committer
    pub signature: &'a Signature,
    /// Timestamp forced onto both author and committer dates
    pub when: DateTime<FixedOffset>,
}

impl CommitRequest<'_> {
    /// Environment overrides scoped to the single `git commit` invocation
    #[must_use]
    pub fn env(&self) -> Vec<(String, String)> {
        let date = format_git_date(&self.when);
        vec![
            ("GIT_AUTHOR_NAME".to_string(), self.signature.name.clone()),
            ("GIT_AUTHOR_EMAIL".to_string(), self.signature.email.clone()),
            ("GIT_COMMITTER_NAME".to_string(), self.signature.name.clone()),
            (
                "GIT_COMMITTER_EMAIL".to_string(),
                self.signature.email.clone(),
            ),
            ("GIT_AUTHOR_DATE".to_string(), date.clone()),
            ("GIT_COMMITTER_DATE".to_string(), date),
        ]
    }
}

/// A commit read back from the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit SHA (40 hex characters)
    pub sha: String,
    /// Commit message
    pub message: String,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp, in the offset it was recorded with
    pub timestamp: DateTime<FixedOffset>,
    /// Parent commit SHAs
    pub parents: Vec<String>,
}

impl Commit {
    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
