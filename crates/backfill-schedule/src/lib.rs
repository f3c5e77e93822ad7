// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! backfill-schedule: work-time commit scheduling
//!
//! This library crate draws plausible working-hours timestamps, alternates
//! between two personas in short runs, applies each planned content
//! mutation at most once, and turns every slot into at most one backdated
//! commit.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use backfill_schedule::prelude::*;
//! use chrono::DateTime;
//!
//! let (personas, registry, generic) = Plan::load("plan.json")
//!     .and_then(Plan::into_parts)
//!     .expect("plan");
//! let range = DateRange::new(
//!     DateTime::parse_from_rfc3339("2025-11-10T09:00:00+00:00").expect("start"),
//!     DateTime::parse_from_rfc3339("2025-11-21T17:00:00+00:00").expect("end"),
//! );
//! let mut scheduler = Scheduler::new(RunConfig::new(personas, range, 20), registry, generic);
//! let summary = scheduler.run(&CommitDriver::new("demo-repo"));
//! print!("{summary}");
//! ```

pub mod driver;
pub mod error;
pub mod identity;
pub mod mutation;
pub mod plan;
pub mod scheduler;
pub mod summary;
pub mod worktime;

pub use driver::{BootstrapOptions, CommitDriver, CommitOutcome};
pub use error::ScheduleError;
pub use identity::{AllocationMode, AllocatorState, IdentityAllocator, MAX_RUN, Persona, PersonaId, PersonaPair};
pub use mutation::{MutationRegistry, MutationSpec, Transform};
pub use plan::Plan;
pub use scheduler::{CountPolicy, RunConfig, ScheduledSlot, Scheduler, SchedulerState};
pub use summary::{PersonaTally, RunSummary, SlotRecord, StopReason};
pub use worktime::{DateRange, WorkHours, WorkTimeConfig, is_work_time, next_work_time};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::driver::{BootstrapOptions, CommitDriver, CommitOutcome};
    pub use crate::error::ScheduleError;
    pub use crate::identity::{Persona, PersonaPair};
    pub use crate::plan::Plan;
    pub use crate::scheduler::{CountPolicy, RunConfig, Scheduler};
    pub use crate::summary::{RunSummary, StopReason};
    pub use crate::worktime::{DateRange, WorkHours, WorkTimeConfig};
}
