// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Plan files
//!
//! A plan is the JSON document that names the two personas, the mutations
//! that give each commit its content, and the messages used for slots that
//! carry no mutation.
//!
//! ```json
//! {
//!   "personas": [
//!     { "name": "Sam", "email": "sam@example.com", "role": "contract" },
//!     { "name": "Jasper", "email": "jasper@example.com", "role": "ui" }
//!   ],
//!   "mutations": [
//!     {
//!       "id": "readme-intro",
//!       "message": "docs: describe the project",
//!       "path": "README.md",
//!       "transform": { "kind": "append", "text": "\nA small demo.\n" }
//!     }
//!   ],
//!   "generic_messages": ["chore: tidy formatting"]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScheduleError;
use crate::identity::{Persona, PersonaPair};
use crate::mutation::{MutationRegistry, MutationSpec};

/// A parsed plan file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Exactly two personas
    pub personas: Vec<Persona>,
    /// Mutations in dispatch preference order
    #[serde(default)]
    pub mutations: Vec<MutationSpec>,
    /// Messages for slots without a mutation
    #[serde(default)]
    pub generic_messages: Vec<String>,
}

impl Plan {
    /// Parse a plan from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid plan document.
    pub fn from_json(text: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a plan file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let plan = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            mutations = plan.mutations.len(),
            "loaded plan"
        );
        Ok(plan)
    }

    /// Check the plan is usable
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::PlanValidation`] when the plan does not list
    /// exactly two personas, a persona has a blank name or email, a mutation
    /// names an owner no persona has, or a message is blank.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.personas.len() != 2 {
            return Err(invalid(format!(
                "expected exactly 2 personas, found {}",
                self.personas.len()
            )));
        }
        for persona in &self.personas {
            if persona.name.trim().is_empty() || persona.email.trim().is_empty() {
                return Err(invalid("persona name and email must not be empty"));
            }
        }
        for mutation in &self.mutations {
            if mutation.message.trim().is_empty() {
                return Err(invalid(format!("mutation {} has an empty message", mutation.id)));
            }
            if let Some(owner) = mutation.owner.as_deref() {
                let known = self
                    .personas
                    .iter()
                    .any(|p| p.role.as_deref() == Some(owner));
                if !known {
                    return Err(invalid(format!(
                        "mutation {} is owned by unknown role '{owner}'",
                        mutation.id
                    )));
                }
            }
        }
        if self.generic_messages.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("generic messages must not be empty"));
        }
        Ok(())
    }

    /// Validate and split into the pieces a scheduler takes
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the registry rejects a
    /// mutation.
    pub fn into_parts(self) -> Result<(PersonaPair, MutationRegistry, Vec<String>), ScheduleError> {
        self.validate()?;
        let mut personas = self.personas.into_iter();
        let (Some(first), Some(second)) = (personas.next(), personas.next()) else {
            return Err(invalid("expected exactly 2 personas"));
        };
        let registry = MutationRegistry::new(self.mutations)?;
        Ok((PersonaPair::new(first, second), registry, self.generic_messages))
    }
}

fn invalid(message: impl Into<String>) -> ScheduleError {
    ScheduleError::PlanValidation {
        message: message.into(),
    }
}
