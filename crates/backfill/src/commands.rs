// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Subcommand implementations
//!
//! Each command takes the parsed arguments and the repository path and
//! returns its result as data; printing is left to the caller.

use std::path::Path;

use backfill_git::{AuditFlag, AuditOptions, AuthorCount, CommitAudit, GitError, HistoryReader};
use backfill_schedule::{
    BootstrapOptions, CommitDriver, PersonaId, Plan, RunConfig, RunSummary, ScheduleError,
    Scheduler,
};
use tracing::{info, warn};

use crate::config::{AuditArgs, ConfigError, RunArgs};

/// Errors surfaced by a command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Invalid arguments
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plan, bootstrap or scheduling failure
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Repository could not be read
    #[error(transparent)]
    Git(#[from] GitError),

    /// Summary file could not be written
    #[error("Failed to write summary: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of `backfill run`
#[derive(Debug)]
pub struct RunReport {
    /// Seed the run used
    pub seed: u64,
    /// Slot log and counts
    pub summary: RunSummary,
    /// Commits per author across the whole repository afterwards
    pub history: Vec<AuthorCount>,
}

/// Load the plan, optionally bootstrap the repository, and run the schedule
///
/// # Errors
///
/// Returns an error if the plan or arguments are invalid, bootstrapping fails,
/// the target is not a git repository, or the summary file cannot be written.
/// Individual commit failures are recorded in the summary instead.
pub fn run(repo: &Path, args: &RunArgs) -> Result<RunReport, CommandError> {
    let (personas, registry, generic_messages) = Plan::load(&args.plan)?.into_parts()?;
    let range = args.range()?;
    let work = args.work_config()?;
    let seed = args.seed.unwrap_or_else(rand::random);

    let driver = CommitDriver::new(repo);
    if args.bootstrap {
        let options = BootstrapOptions {
            initial_message: args.initial_commit.clone(),
            branch: args.branch.clone(),
        };
        driver.bootstrap(&options, personas.get(PersonaId::First), range.start())?;
    }
    // The target must already be a repository
    HistoryReader::open(repo)?;

    let config = RunConfig {
        seed,
        personas,
        range,
        work,
        target_count: args.count,
        policy: args.policy,
        max_extra_slots: args.max_extra_slots.unwrap_or(args.count),
        allocation: args.allocation,
    };
    info!(
        seed,
        count = args.count,
        policy = %args.policy,
        allocation = %args.allocation,
        repo = %repo.display(),
        "starting run"
    );

    let mut scheduler = Scheduler::new(config, registry, generic_messages);
    let summary = scheduler.run(&driver);
    if summary.created() < args.count {
        warn!(
            created = summary.created(),
            requested = args.count,
            "created fewer commits than requested"
        );
    }

    if let Some(path) = &args.summary_file {
        summary.write_to(path)?;
        info!(path = %path.display(), "wrote summary");
    }

    let history = HistoryReader::open(repo)?.author_counts()?;
    Ok(RunReport {
        seed,
        summary,
        history,
    })
}

/// Audit the repository's history
///
/// Only flagged commits are returned unless `--all` is given.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened or a diff cannot be
/// read.
pub fn audit(repo: &Path, args: &AuditArgs) -> Result<Vec<CommitAudit>, CommandError> {
    let reader = HistoryReader::open(repo)?;
    let options = AuditOptions {
        min_substantive_lines: args.min_lines,
        placeholder_prefix: args.placeholder_prefix.clone(),
    };
    let audits = reader.audit(&options)?;
    let flagged = audits.iter().filter(|a| a.flag.is_some()).count();
    info!(commits = audits.len(), flagged, "audit complete");

    Ok(if args.all {
        audits
    } else {
        audits.into_iter().filter(|a| a.flag.is_some()).collect()
    })
}

/// Render audit results as text, one line per commit
#[must_use]
pub fn format_audit(audits: &[CommitAudit]) -> String {
    let mut out = String::new();
    for audit in audits {
        let verdict = match &audit.flag {
            None => "ok".to_string(),
            Some(AuditFlag::Empty) => "EMPTY".to_string(),
            Some(AuditFlag::PlaceholderOnly) => "PLACEHOLDER".to_string(),
            Some(AuditFlag::Minimal { lines }) => format!("MINIMAL ({lines} lines)"),
        };
        out.push_str(&format!(
            "{} {} {:<20} [{}] {}\n",
            audit.commit.short_sha(),
            audit.commit.timestamp.format("%Y-%m-%d %H:%M"),
            audit.commit.author,
            verdict,
            audit.commit.subject()
        ));
    }
    out
}

/// Render per-author totals
#[must_use]
pub fn format_history(history: &[AuthorCount]) -> String {
    let mut out = String::from("Repository history:\n");
    for author in history {
        out.push_str(&format!(
            "  {:>5}  {} <{}>\n",
            author.commits, author.name, author.email
        ));
    }
    out
}
