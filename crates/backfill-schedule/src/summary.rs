// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run summary

use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::driver::CommitOutcome;
use crate::identity::{PersonaId, PersonaPair};

/// Why the scheduler stopped dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The target number of commits was reached
    TargetReached,
    /// No further valid timestamps could be drawn
    RangeExhausted,
    /// A slot was skipped and no unconsumed mutation remains
    MutationsExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TargetReached => "target reached",
            Self::RangeExhausted => "date range exhausted",
            Self::MutationsExhausted => "mutations exhausted",
        };
        f.write_str(text)
    }
}

/// One dispatched slot and what happened to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Slot timestamp
    pub timestamp: DateTime<FixedOffset>,
    /// Persona owning the slot
    pub persona: PersonaId,
    /// Commit message used
    pub message: String,
    /// Mutation dispatched with the slot, if any
    pub mutation_id: Option<String>,
    /// Result of the attempt
    pub outcome: CommitOutcome,
}

/// Per-persona line of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaTally {
    /// Persona name
    pub name: String,
    /// Persona email
    pub email: String,
    /// Commits created
    pub created: usize,
}

/// Aggregated result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Personas of the run
    pub personas: PersonaPair,
    /// Every dispatched slot, in dispatch order
    pub records: Vec<SlotRecord>,
    /// Why dispatching ended
    pub stop: Option<StopReason>,
}

impl RunSummary {
    /// Empty summary for a run
    #[must_use]
    pub fn new(personas: PersonaPair) -> Self {
        Self {
            personas,
            records: Vec::new(),
            stop: None,
        }
    }

    /// Record one slot
    pub fn record(&mut self, record: SlotRecord) {
        self.records.push(record);
    }

    /// Number of commits created
    #[must_use]
    pub fn created(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_created()).count()
    }

    /// Number of slots skipped for an empty index
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == CommitOutcome::SkippedNoChange)
            .count()
    }

    /// Number of failed attempts
    #[must_use]
    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, CommitOutcome::Failed { .. }))
            .count()
    }

    /// Commits created per persona
    #[must_use]
    pub fn per_persona(&self) -> Vec<PersonaTally> {
        self.personas
            .iter()
            .map(|(id, persona)| PersonaTally {
                name: persona.name.clone(),
                email: persona.email.clone(),
                created: self
                    .records
                    .iter()
                    .filter(|r| r.persona == id && r.outcome.is_created())
                    .count(),
            })
            .collect()
    }

    /// First and last timestamp of the created commits
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let mut created = self
            .records
            .iter()
            .filter(|r| r.outcome.is_created())
            .map(|r| r.timestamp);
        let first = created.next()?;
        let last = created.last().unwrap_or(first);
        Some((first, last))
    }

    /// Write the human-readable summary to `path`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_string())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commit Summary")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Total commits: {} (skipped {}, failed {})",
            self.created(),
            self.skipped(),
            self.failed()
        )?;
        for tally in self.per_persona() {
            writeln!(f, "{} <{}>: {} commits", tally.name, tally.email, tally.created)?;
        }
        if let Some((first, last)) = self.span() {
            writeln!(
                f,
                "Time range: {} to {}",
                first.format("%Y-%m-%d %H:%M:%S %z"),
                last.format("%Y-%m-%d %H:%M:%S %z")
            )?;
        }
        if let Some(stop) = self.stop {
            writeln!(f, "Stopped: {stop}")?;
        }

        writeln!(f)?;
        writeln!(f, "Detailed commits:")?;
        writeln!(f, "{}", "-".repeat(50))?;
        for record in &self.records {
            let persona = self.personas.get(record.persona);
            let status = match &record.outcome {
                CommitOutcome::Created { sha } => sha[..7.min(sha.len())].to_string(),
                CommitOutcome::SkippedNoChange => "skipped".to_string(),
                CommitOutcome::Failed { .. } => "FAILED".to_string(),
            };
            writeln!(
                f,
                "{} - {} ({}) - [{}] {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                persona.name,
                persona.email,
                status,
                record.message
            )?;
        }
        Ok(())
    }
}
