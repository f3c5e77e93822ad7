// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the backfill CLI
//!
//! This module provides the command-line surface: the target repository,
//! the `run` and `audit` subcommands, and logging options.

use std::path::PathBuf;

use backfill_schedule::{AllocationMode, CountPolicy, DateRange, ScheduleError, WorkHours, WorkTimeConfig};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use clap::{Args, Parser, Subcommand};

/// Input format for `--start` and `--end`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Backfill - schedule a plausible, backdated two-author commit history
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "backfill")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Working tree to commit into or audit
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "BACKFILL_REPO", global = true)]
    pub repo: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs every git invocation and scheduling decision to stderr.
    #[arg(short, long, default_value = "false", global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate backdated commits from a plan
    ///
    /// Example:
    ///   backfill run --plan plan.json --start "2025-11-10 09:00" --end "2025-11-21 17:00" --count 20
    Run(RunArgs),

    /// Flag commits that carry no substantive change
    Audit(AuditArgs),
}

/// Options for `backfill run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Plan file with personas, mutations and generic messages (JSON)
    #[arg(short, long, env = "BACKFILL_PLAN")]
    pub plan: PathBuf,

    /// First moment commits may be dated (YYYY-MM-DD HH:MM)
    #[arg(long, value_parser = parse_datetime)]
    pub start: NaiveDateTime,

    /// Last moment commits may be dated (YYYY-MM-DD HH:MM)
    #[arg(long, value_parser = parse_datetime)]
    pub end: NaiveDateTime,

    /// UTC offset the range and work hours are expressed in (+HHMM)
    #[arg(long, default_value = "+0000", value_parser = parse_offset, allow_hyphen_values = true)]
    pub utc_offset: FixedOffset,

    /// First working hour (inclusive)
    #[arg(long, default_value = "9")]
    pub work_start: u32,

    /// End of the working day (exclusive)
    #[arg(long, default_value = "17")]
    pub work_end: u32,

    /// Number of commits to create
    #[arg(short = 'n', long, default_value = "20")]
    pub count: usize,

    /// Use minutes that are not multiples of five instead of quarter hours
    #[arg(long, default_value = "false")]
    pub avoid_round_minutes: bool,

    /// How skipped slots count towards --count (replace or permissive)
    #[arg(long, default_value = "replace")]
    pub policy: CountPolicy,

    /// Extra slots the replace policy may draw (defaults to --count)
    #[arg(long)]
    pub max_extra_slots: Option<usize>,

    /// How authors take turns (run-length or alternate)
    #[arg(long, default_value = "run-length")]
    pub allocation: AllocationMode,

    /// Seed for the random source; a random seed is drawn and logged if unset
    #[arg(long, env = "BACKFILL_SEED")]
    pub seed: Option<u64>,

    /// Initialize the repository before scheduling
    #[arg(long, default_value = "false")]
    pub bootstrap: bool,

    /// With --bootstrap, create an empty root commit with this message
    #[arg(long, requires = "bootstrap")]
    pub initial_commit: Option<String>,

    /// With --initial-commit, rename the branch afterwards
    #[arg(long, requires = "initial_commit")]
    pub branch: Option<String>,

    /// Also write the summary to this file
    #[arg(long)]
    pub summary_file: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,
}

/// Options for `backfill audit`
#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    /// Flag commits with fewer substantive lines than this
    #[arg(long, default_value = "3")]
    pub min_lines: usize,

    /// Files whose name starts with this prefix count as placeholders
    #[arg(long)]
    pub placeholder_prefix: Option<String>,

    /// Show every commit, not only flagged ones
    #[arg(long, default_value = "false")]
    pub all: bool,

    /// Print the results as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM, got '{s}': {e}"))
}

fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    let invalid = || format!("expected an offset like +0000 or -0530, got '{s}'");

    let (sign, digits) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let digits = digits.replace(':', "");
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

impl RunArgs {
    /// `--start`/`--end` in the configured offset
    ///
    /// # Errors
    ///
    /// Returns an error if `--end` is before `--start`.
    pub fn range(&self) -> Result<DateRange, ConfigError> {
        let start = self.localize(self.start)?;
        let end = self.localize(self.end)?;
        Ok(DateRange::try_new(start, end)?)
    }

    fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>, ConfigError> {
        self.utc_offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| ConfigError::InvalidDateTime(naive.to_string()))
    }

    /// Work hours and minute style
    ///
    /// # Errors
    ///
    /// Returns an error unless `work_start < work_end <= 24`.
    pub fn work_config(&self) -> Result<WorkTimeConfig, ConfigError> {
        Ok(WorkTimeConfig {
            hours: WorkHours::new(self.work_start, self.work_end)?,
            avoid_round_minutes: self.avoid_round_minutes,
        })
    }
}

impl Config {
    /// Get the repository path, using the current directory as default
    #[must_use]
    pub fn repo_path(&self) -> PathBuf {
        self.repo.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository path exists but is not a directory
    /// - `audit` targets a repository path that does not exist
    /// - `run` is given a missing plan file, bad work hours or a reversed range
    /// - `run` without `--bootstrap` targets a missing repository path
    pub fn validate(&self) -> Result<(), ConfigError> {
        let repo = self.repo_path();
        if repo.exists() && !repo.is_dir() {
            return Err(ConfigError::RepoNotDirectory(repo));
        }

        match &self.command {
            Some(Command::Run(args)) => {
                if !args.plan.is_file() {
                    return Err(ConfigError::PlanNotFound(args.plan.clone()));
                }
                if !args.bootstrap && !repo.exists() {
                    return Err(ConfigError::RepoNotFound(repo));
                }
                args.work_config()?;
                args.range()?;
            }
            Some(Command::Audit(_)) => {
                if !repo.exists() {
                    return Err(ConfigError::RepoNotFound(repo));
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),

    /// Plan file not found
    #[error("Plan file not found: {0}")]
    PlanNotFound(PathBuf),

    /// A local date-time has no single meaning in the configured offset
    #[error("Invalid date-time: {0}")]
    InvalidDateTime(String),

    /// Work hours or range rejected by the scheduler
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
