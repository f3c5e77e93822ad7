// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Personas and identity allocation

use backfill_git::Signature;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest run of consecutive slots owned by one persona
pub const MAX_RUN: u32 = 3;

/// A fixed identity that commits are attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Area of the project this persona works on; matches mutation owners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Persona {
    /// Create a persona without a role
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: None,
        }
    }

    /// Attach a role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Author/committer signature for git
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::new(&self.name, &self.email)
    }
}

/// Which of the two personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaId {
    /// The first persona
    First,
    /// The second persona
    Second,
}

impl PersonaId {
    /// The other persona
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Exactly two personas, fixed for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaPair {
    first: Persona,
    second: Persona,
}

impl PersonaPair {
    /// Create the pair
    #[must_use]
    pub fn new(first: Persona, second: Persona) -> Self {
        Self { first, second }
    }

    /// Look up a persona
    #[must_use]
    pub fn get(&self, id: PersonaId) -> &Persona {
        match id {
            PersonaId::First => &self.first,
            PersonaId::Second => &self.second,
        }
    }

    /// Both personas in order
    pub fn iter(&self) -> impl Iterator<Item = (PersonaId, &Persona)> {
        [
            (PersonaId::First, &self.first),
            (PersonaId::Second, &self.second),
        ]
        .into_iter()
    }
}

/// Snapshot of the allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorState {
    /// Persona owning the current run
    pub current: PersonaId,
    /// Slots left in the current run
    pub remaining_in_run: u32,
}

/// How the allocator hands slots between personas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Runs of 1 to [`MAX_RUN`] slots, length drawn per run
    #[default]
    RunLength,
    /// Strict alternation, one slot each
    Alternate,
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RunLength => "run-length",
            Self::Alternate => "alternate",
        })
    }
}

impl FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "run-length" | "run_length" => Ok(Self::RunLength),
            "alternate" => Ok(Self::Alternate),
            other => Err(format!(
                "unknown allocation mode '{other}' (expected run-length or alternate)"
            )),
        }
    }
}

/// Assigns slots to personas in runs of 1 to [`MAX_RUN`], or strictly
/// alternating
#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    state: AllocatorState,
    mode: AllocationMode,
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAllocator {
    /// Start so that the first allocation opens a run for the first persona
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(AllocatorState {
            current: PersonaId::Second,
            remaining_in_run: 0,
        })
    }

    /// Fresh allocator using `mode`
    #[must_use]
    pub fn with_mode(mode: AllocationMode) -> Self {
        Self {
            mode,
            ..Self::new()
        }
    }

    /// Resume from a snapshot
    #[must_use]
    pub fn from_state(state: AllocatorState) -> Self {
        Self {
            state,
            mode: AllocationMode::default(),
        }
    }

    /// Allocation mode
    #[must_use]
    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Current snapshot
    #[must_use]
    pub fn state(&self) -> AllocatorState {
        self.state
    }

    /// Allocate the next slot
    ///
    /// When the current run is used up the other persona takes over with a
    /// fresh run length drawn uniformly from `1..=MAX_RUN`. In
    /// [`AllocationMode::Alternate`] every run has length 1 and `rng` is not
    /// touched.
    pub fn next_persona<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PersonaId {
        if self.state.remaining_in_run == 0 {
            self.state.current = self.state.current.other();
            self.state.remaining_in_run = match self.mode {
                AllocationMode::RunLength => rng.random_range(1..=MAX_RUN),
                AllocationMode::Alternate => 1,
            };
            debug!(
                persona = ?self.state.current,
                run = self.state.remaining_in_run,
                "starting persona run"
            );
        }
        self.state.remaining_in_run -= 1;
        self.state.current
    }
}
