// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Scheduler
//!
//! Composes the work-time generator, the identity allocator, the mutation
//! registry and the commit driver into one run:
//!
//! ```text
//! Idle -> Generating -> Dispatching -> Done
//! ```
//!
//! # Example
//!
//! ```no_run
//! use backfill_schedule::prelude::*;
//!
//! let plan = Plan::load("plan.json").expect("load plan");
//! let (personas, registry, generic) = plan.into_parts().expect("valid plan");
//! # let range: DateRange = unimplemented!();
//! let config = RunConfig::new(personas, range, 20);
//! let mut scheduler = Scheduler::new(config, registry, generic);
//! let summary = scheduler.run(&CommitDriver::new("."));
//! println!("{summary}");
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use backfill_git::CommandExecutor;

use crate::driver::{CommitDriver, CommitOutcome};
use crate::identity::{AllocationMode, IdentityAllocator, PersonaId, PersonaPair};
use crate::mutation::MutationRegistry;
use crate::summary::{RunSummary, SlotRecord, StopReason};
use crate::worktime::{DateRange, WorkTimeConfig, is_work_time, next_work_time};

/// Message used for slots without a mutation when the plan lists none
pub const DEFAULT_GENERIC_MESSAGE: &str = "chore: update project files";

/// Distinct-timestamp draws allowed per requested slot while generating
const DRAWS_PER_SLOT: usize = 20;

/// How skipped and failed slots count towards the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// Only created commits count; extra slots are drawn after the last
    /// dispatched one to make up for skips and failures
    #[default]
    Replace,
    /// Every dispatched slot counts; the run ends with the initial slots
    Permissive,
}

impl fmt::Display for CountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Permissive => "permissive",
        })
    }
}

impl FromStr for CountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!(
                "unknown count policy '{other}' (expected replace or permissive)"
            )),
        }
    }
}

/// Everything a run needs besides its plan data
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seed for the run's random source
    pub seed: u64,
    /// The two personas
    pub personas: PersonaPair,
    /// Range the commits must fall in
    pub range: DateRange,
    /// Work hours and minute style
    pub work: WorkTimeConfig,
    /// Commits wanted
    pub target_count: usize,
    /// Skip counting policy
    pub policy: CountPolicy,
    /// Extra slots the `Replace` policy may draw
    pub max_extra_slots: usize,
    /// How personas take turns
    pub allocation: AllocationMode,
}

impl RunConfig {
    /// Config with default work hours, seed 0 and the `Replace` policy
    #[must_use]
    pub fn new(personas: PersonaPair, range: DateRange, target_count: usize) -> Self {
        Self {
            seed: 0,
            personas,
            range,
            work: WorkTimeConfig::default(),
            target_count,
            policy: CountPolicy::default(),
            max_extra_slots: target_count,
            allocation: AllocationMode::default(),
        }
    }
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started
    Idle,
    /// Drawing timestamps
    Generating,
    /// Walking slots and committing
    Dispatching,
    /// Finished
    Done(StopReason),
}

/// A timestamp paired with a persona and the work it will carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledSlot {
    /// When the commit is dated
    pub timestamp: DateTime<FixedOffset>,
    /// Who the commit is attributed to
    pub persona: PersonaId,
    /// Commit message
    pub message: String,
    /// Mutation to apply, if any
    pub mutation_id: Option<String>,
    /// File the mutation targets
    pub target_file: Option<String>,
}

/// Drives a run from timestamp generation to the final summary
pub struct Scheduler<R = StdRng> {
    config: RunConfig,
    rng: R,
    allocator: IdentityAllocator,
    registry: MutationRegistry,
    generic_messages: Vec<String>,
    generic_cursor: usize,
    state: SchedulerState,
    range_exhausted: bool,
}

impl Scheduler<StdRng> {
    /// Scheduler seeded from `config.seed`
    #[must_use]
    pub fn new(config: RunConfig, registry: MutationRegistry, generic_messages: Vec<String>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, registry, generic_messages, rng)
    }
}

impl<R: Rng> Scheduler<R> {
    /// Scheduler with an injected random source
    #[must_use]
    pub fn with_rng(
        config: RunConfig,
        registry: MutationRegistry,
        generic_messages: Vec<String>,
        rng: R,
    ) -> Self {
        let allocator = IdentityAllocator::with_mode(config.allocation);
        Self {
            config,
            rng,
            allocator,
            registry,
            generic_messages,
            generic_cursor: 0,
            state: SchedulerState::Idle,
            range_exhausted: false,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether the last [`Scheduler::generate`] returned fewer slots than
    /// requested
    #[must_use]
    pub fn range_exhausted(&self) -> bool {
        self.range_exhausted
    }

    /// The mutation registry
    #[must_use]
    pub fn registry(&self) -> &MutationRegistry {
        &self.registry
    }

    /// Draw up to `target_count` distinct work-times, ascending
    ///
    /// Fewer are returned when the range cannot supply enough distinct
    /// timestamps within a bounded number of draws.
    pub fn generate(&mut self) -> Vec<DateTime<FixedOffset>> {
        self.state = SchedulerState::Generating;
        let wanted = self.config.target_count;
        let mut slots = BTreeSet::new();

        for _ in 0..wanted.saturating_mul(DRAWS_PER_SLOT) {
            if slots.len() >= wanted {
                break;
            }
            let t = next_work_time(&self.config.range, &self.config.work, &mut self.rng);
            if is_work_time(&t, &self.config.work.hours) {
                slots.insert(t);
            }
        }

        if slots.len() < wanted {
            warn!(
                wanted,
                drawn = slots.len(),
                "date range cannot supply enough work-time slots"
            );
            self.range_exhausted = true;
        }
        debug!(count = slots.len(), "generated slots");
        slots.into_iter().collect()
    }

    /// Build the slot for `timestamp`: allocate a persona and pick its work
    pub fn plan_slot(&mut self, timestamp: DateTime<FixedOffset>) -> ScheduledSlot {
        let persona = self.allocator.next_persona(&mut self.rng);
        let role = self.config.personas.get(persona).role.as_deref();
        let picked = self
            .registry
            .next_for(role)
            .map(|m| (m.message.clone(), m.id.clone(), m.path.clone()));

        match picked {
            Some((message, id, path)) => ScheduledSlot {
                timestamp,
                persona,
                message,
                mutation_id: Some(id),
                target_file: Some(path),
            },
            None => ScheduledSlot {
                timestamp,
                persona,
                message: self.next_generic_message(),
                mutation_id: None,
                target_file: None,
            },
        }
    }

    fn next_generic_message(&mut self) -> String {
        if self.generic_messages.is_empty() {
            return DEFAULT_GENERIC_MESSAGE.to_string();
        }
        let message = self.generic_messages[self.generic_cursor % self.generic_messages.len()].clone();
        self.generic_cursor += 1;
        message
    }

    /// Draw one more slot strictly after `last`
    fn extra_slot(&mut self, last: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let range = DateRange::new(last + Duration::seconds(1), self.config.range.end());
        if range.is_degenerate() {
            return None;
        }
        let t = next_work_time(&range, &self.config.work, &mut self.rng);
        (t > last && is_work_time(&t, &self.config.work.hours)).then_some(t)
    }

    /// Run to completion
    ///
    /// Timestamps reach the driver in strictly increasing order. Skipped and
    /// failed slots are recorded and the run moves on; how they count towards
    /// the target depends on [`CountPolicy`]. A mutation that was dispatched
    /// but did not land is retired for the rest of the run, so later slots
    /// fall through to the next mutation or a generic message.
    pub fn run<E: CommandExecutor>(&mut self, driver: &CommitDriver<E>) -> RunSummary {
        let mut summary = RunSummary::new(self.config.personas.clone());
        let mut queue: VecDeque<_> = self.generate().into();

        self.state = SchedulerState::Dispatching;
        info!(
            slots = queue.len(),
            target = self.config.target_count,
            policy = %self.config.policy,
            "dispatching"
        );

        let mut counted = 0usize;
        let mut extra_used = 0usize;
        let mut last: Option<DateTime<FixedOffset>> = None;

        let stop = loop {
            if counted >= self.config.target_count {
                break StopReason::TargetReached;
            }

            let timestamp = match queue.pop_front() {
                Some(t) => t,
                None => {
                    let can_extend = self.config.policy == CountPolicy::Replace
                        && extra_used < self.config.max_extra_slots;
                    let extra = if can_extend {
                        extra_used += 1;
                        let after = last.unwrap_or(self.config.range.start() - Duration::seconds(1));
                        self.extra_slot(after)
                    } else {
                        None
                    };
                    match extra {
                        Some(t) => {
                            debug!(%t, "drew extra slot");
                            t
                        }
                        None => break StopReason::RangeExhausted,
                    }
                }
            };

            let slot = self.plan_slot(timestamp);
            let persona = self.config.personas.get(slot.persona);
            let outcome = driver.commit(
                &mut self.registry,
                persona,
                &slot.message,
                slot.timestamp,
                slot.target_file.as_deref().map(Path::new),
                slot.mutation_id.as_deref(),
            );

            let skipped = outcome == CommitOutcome::SkippedNoChange;
            if outcome.is_created() || self.config.policy == CountPolicy::Permissive {
                counted += 1;
            }
            if let Some(id) = slot.mutation_id.as_deref()
                && !self.registry.is_consumed(id)
            {
                self.registry.retire(id);
            }
            last = Some(slot.timestamp);
            summary.record(SlotRecord {
                timestamp: slot.timestamp,
                persona: slot.persona,
                message: slot.message,
                mutation_id: slot.mutation_id,
                outcome,
            });

            if skipped && self.registry.dispatchable() == 0 {
                break StopReason::MutationsExhausted;
            }
        };

        info!(
            created = summary.created(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            %stop,
            "run finished"
        );
        self.state = SchedulerState::Done(stop);
        summary.stop = Some(stop);
        summary
    }
}
