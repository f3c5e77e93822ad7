// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Read-only view of the generated history
//!
//! This module reads commits back through `git2` for run summaries and for
//! auditing commits whose diffs carry little or no real change.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, Sort};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::Commit;
use crate::error::GitError;

/// Configuration for walking commits
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum number of commits to retrieve
    pub limit: Option<usize>,
    /// Only include commits at or after this date
    pub since: Option<DateTime<FixedOffset>>,
    /// Only include commits at or before this date
    pub until: Option<DateTime<FixedOffset>>,
    /// Yield the oldest commit first
    pub oldest_first: bool,
}

impl WalkOptions {
    /// Create options for walking the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Walk from the root commit towards HEAD
    #[must_use]
    pub fn oldest_first(mut self) -> Self {
        self.oldest_first = true;
        self
    }

    /// Filter commits since a date
    #[must_use]
    pub fn since(mut self, date: DateTime<FixedOffset>) -> Self {
        self.since = Some(date);
        self
    }

    /// Filter commits until a date
    #[must_use]
    pub fn until(mut self, date: DateTime<FixedOffset>) -> Self {
        self.until = Some(date);
        self
    }
}

/// Commit count for one author identity, as `git shortlog -sne` reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
    /// Number of commits
    pub commits: usize,
}

/// Thresholds for [`HistoryReader::audit`]
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Commits with fewer substantive lines than this are flagged
    pub min_substantive_lines: usize,
    /// Files whose name starts with this prefix count as placeholders
    pub placeholder_prefix: Option<String>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            min_substantive_lines: 3,
            placeholder_prefix: None,
        }
    }
}

/// Why a commit was flagged by the audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFlag {
    /// The commit changes no files
    Empty,
    /// Every changed file is a placeholder
    PlaceholderOnly,
    /// The diff has fewer substantive lines than the threshold
    Minimal {
        /// Substantive lines found
        lines: usize,
    },
}

/// Audit result for one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAudit {
    /// The audited commit
    pub commit: Commit,
    /// Paths touched by the commit
    pub files: Vec<String>,
    /// Added or removed lines that are neither blank nor comments
    pub substantive_lines: usize,
    /// Set when the commit does not carry a real change
    pub flag: Option<AuditFlag>,
}

/// Whether a diff line counts as a real code change
#[must_use]
pub fn is_substantive_line(content: &str) -> bool {
    let trimmed = content.trim();
    !(trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*'))
}

/// A git repository opened for reading history
pub struct HistoryReader {
    repo: Repository,
}

impl HistoryReader {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Get the working directory path (None for bare repos)
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Walk commits reachable from HEAD
    ///
    /// A repository without commits yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked.
    pub fn walk_commits(&self, options: &WalkOptions) -> Result<Vec<Commit>, GitError> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        let mut sorting = Sort::TIME | Sort::TOPOLOGICAL;
        if options.oldest_first {
            sorting |= Sort::REVERSE;
        }
        revwalk.set_sorting(sorting)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);

        for oid_result in revwalk {
            if commits.len() >= limit {
                break;
            }

            let git_commit = self.repo.find_commit(oid_result?)?;
            let commit = extract_commit(&git_commit);

            if let Some(since) = options.since {
                if commit.timestamp < since {
                    continue;
                }
            }
            if let Some(until) = options.until {
                if commit.timestamp > until {
                    continue;
                }
            }

            commits.push(commit);
        }

        Ok(commits)
    }

    /// Number of commits reachable from HEAD
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked.
    pub fn commit_count(&self) -> Result<usize, GitError> {
        if !self.has_head()? {
            return Ok(0);
        }
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        Ok(revwalk.count())
    }

    /// Commits per author, most active first
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked.
    pub fn author_counts(&self) -> Result<Vec<AuthorCount>, GitError> {
        let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
        for commit in self.walk_commits(&WalkOptions::default())? {
            *counts
                .entry((commit.author, commit.author_email))
                .or_default() += 1;
        }

        let mut authors: Vec<AuthorCount> = counts
            .into_iter()
            .map(|((name, email), commits)| AuthorCount {
                name,
                email,
                commits,
            })
            .collect();
        authors.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(&b.name)));
        Ok(authors)
    }

    /// Inspect every commit's diff and flag the ones without a real change
    ///
    /// Root commits are compared against the empty tree.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if a commit or its diff cannot be read.
    pub fn audit(&self, options: &AuditOptions) -> Result<Vec<CommitAudit>, GitError> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push_head()?;

        let mut audits = Vec::new();
        for oid_result in revwalk {
            let git_commit = self.repo.find_commit(oid_result?)?;
            audits.push(self.audit_commit(&git_commit, options)?);
        }
        Ok(audits)
    }

    fn audit_commit(
        &self,
        git_commit: &git2::Commit<'_>,
        options: &AuditOptions,
    ) -> Result<CommitAudit, GitError> {
        let tree = git_commit.tree()?;
        let parent_tree = if git_commit.parent_count() > 0 {
            Some(git_commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut opts = DiffOptions::new();
        opts.ignore_whitespace(false);
        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

        let files: Vec<String> = diff
            .deltas()
            .map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string())
            })
            .collect();

        let mut substantive_lines = 0;
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-')
                && is_substantive_line(&String::from_utf8_lossy(line.content()))
            {
                substantive_lines += 1;
            }
            true
        })?;

        let placeholder_only = match options.placeholder_prefix.as_deref() {
            Some(prefix) if !files.is_empty() => files.iter().all(|path| {
                Path::new(path)
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
            }),
            _ => false,
        };

        let flag = if files.is_empty() {
            Some(AuditFlag::Empty)
        } else if placeholder_only {
            Some(AuditFlag::PlaceholderOnly)
        } else if substantive_lines < options.min_substantive_lines {
            Some(AuditFlag::Minimal {
                lines: substantive_lines,
            })
        } else {
            None
        };

        let commit = extract_commit(git_commit);
        debug!(sha = %commit.short_sha(), substantive_lines, ?flag, "audited commit");

        Ok(CommitAudit {
            commit,
            files,
            substantive_lines,
            flag,
        })
    }

    fn has_head(&self) -> Result<bool, GitError> {
        match self.repo.head() {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Convert a git2 timestamp, keeping its recorded offset
fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(|| Utc::now().fixed_offset())
}

fn extract_commit(git_commit: &git2::Commit<'_>) -> Commit {
    let author = git_commit.author();
    Commit {
        sha: git_commit.id().to_string(),
        message: git_commit.message().unwrap_or("").to_string(),
        author: author.name().unwrap_or("Unknown").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        timestamp: to_datetime(author.when()),
        parents: git_commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_open_nonexistent_repository() {
        let result = HistoryReader::open("/nonexistent/path");
        match result {
            Err(GitError::RepositoryNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected RepositoryNotFound error"),
        }
    }

    #[test]
    fn test_empty_repository_has_no_commits() {
        let dir = tempfile::tempdir().expect("tempdir");
        Repository::init(dir.path()).expect("init");
        let reader = HistoryReader::open(dir.path()).expect("open");

        assert_eq!(reader.commit_count().expect("count"), 0);
        assert!(reader.walk_commits(&WalkOptions::default()).expect("walk").is_empty());
        assert!(reader.author_counts().expect("authors").is_empty());
        assert!(reader.audit(&AuditOptions::default()).expect("audit").is_empty());
    }

    #[test]
    fn test_is_substantive_line() {
        assert!(is_substantive_line("return block.timestamp >= unlock;"));
        assert!(!is_substantive_line("   "));
        assert!(!is_substantive_line("// a comment"));
        assert!(!is_substantive_line("/* block */"));
        assert!(!is_substantive_line(" * continued"));
    }

    #[test]
    fn test_to_datetime_keeps_offset() {
        let time = git2::Time::new(1_762_794_000, -480);
        let dt = to_datetime(time);
        assert_eq!(dt.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(dt.timestamp(), 1_762_794_000);
    }

    #[test]
    fn test_walk_options_builder() {
        let since = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 11, 10, 0, 0, 0)
            .unwrap();
        let options = WalkOptions::latest(10).oldest_first().since(since);

        assert_eq!(options.limit, Some(10));
        assert!(options.oldest_first);
        assert_eq!(options.since, Some(since));
        assert!(options.until.is_none());
    }

    #[test]
    fn test_audit_flag_serialization() {
        let json = serde_json::to_string(&AuditFlag::Minimal { lines: 1 }).expect("serialize");
        assert_eq!(json, r#"{"minimal":{"lines":1}}"#);
    }
}
