// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for backfill-schedule

use thiserror::Error;

/// Errors that can occur while configuring or running a schedule
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Work hours are empty or out of bounds
    #[error("Invalid work hours: {start}..{end} (need start < end <= 24)")]
    InvalidWorkHours {
        /// First allowed hour
        start: u32,
        /// First disallowed hour
        end: u32,
    },

    /// The date range ends before it starts
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange {
        /// Range start
        start: String,
        /// Range end
        end: String,
    },

    /// The plan file is not valid JSON for a plan
    #[error("Plan parse error: {0}")]
    Plan(#[from] serde_json::Error),

    /// The plan parsed but is inconsistent
    #[error("Invalid plan: {message}")]
    PlanValidation {
        /// Description of the problem
        message: String,
    },

    /// Two mutations share an id
    #[error("Duplicate mutation id: {id}")]
    DuplicateMutation {
        /// The repeated id
        id: String,
    },

    /// A regex mutation does not compile
    #[error("Invalid regex in mutation {id}: {message}")]
    InvalidRegex {
        /// The mutation id
        id: String,
        /// Compiler message
        message: String,
    },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] backfill_git::GitError),
}
