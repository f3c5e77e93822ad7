// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Mutation registry
//!
//! A mutation is the content edit behind one commit's narrative. The registry
//! applies each mutation at most once: after the first application that
//! actually changes content, the mutation is consumed and further requests
//! for it are no-ops.

use std::collections::HashMap;
use std::path::{Component, Path};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ScheduleError;

/// A text transformation, expressed as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Replace the first occurrence of `from`
    Replace {
        /// Text to find
        from: String,
        /// Replacement
        to: String,
    },
    /// Replace every occurrence of `from`
    ReplaceAll {
        /// Text to find
        from: String,
        /// Replacement
        to: String,
    },
    /// Replace the first regex match; `$1`-style groups are expanded
    Regex {
        /// Pattern
        pattern: String,
        /// Replacement template
        replacement: String,
    },
    /// Set the whole file content, creating the file if needed
    Write {
        /// New content
        content: String,
    },
    /// Append text unless the content already ends with it
    Append {
        /// Text to append
        text: String,
    },
}

/// One registry entry as it appears in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSpec {
    /// Unique id
    pub id: String,
    /// Commit message for the commit carrying this edit
    pub message: String,
    /// Target file, relative to the working tree root
    pub path: String,
    /// Persona role this mutation belongs to; `None` means anyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// The edit
    pub transform: Transform,
}

#[derive(Debug)]
struct Mutation {
    spec: MutationSpec,
    regex: Option<Regex>,
    consumed: bool,
    retired: bool,
}

impl Mutation {
    fn new(spec: MutationSpec) -> Result<Self, ScheduleError> {
        let regex = match &spec.transform {
            Transform::Regex { pattern, .. } => {
                Some(Regex::new(pattern).map_err(|e| ScheduleError::InvalidRegex {
                    id: spec.id.clone(),
                    message: e.to_string(),
                })?)
            }
            Transform::Replace { from, .. } | Transform::ReplaceAll { from, .. }
                if from.is_empty() =>
            {
                return Err(ScheduleError::PlanValidation {
                    message: format!("mutation {} replaces an empty string", spec.id),
                });
            }
            _ => None,
        };
        Ok(Self {
            spec,
            regex,
            consumed: false,
            retired: false,
        })
    }

    fn is_dispatchable(&self) -> bool {
        !self.consumed && !self.retired
    }

    fn transform(&self, content: &str) -> String {
        match &self.spec.transform {
            Transform::Replace { from, to } => content.replacen(from.as_str(), to, 1),
            Transform::ReplaceAll { from, to } => content.replace(from.as_str(), to),
            Transform::Regex { replacement, .. } => match &self.regex {
                Some(regex) => regex.replace(content, replacement.as_str()).into_owned(),
                None => content.to_string(),
            },
            Transform::Write { content: new } => new.clone(),
            Transform::Append { text } => {
                if content.ends_with(text.as_str()) {
                    content.to_string()
                } else {
                    format!("{content}{text}")
                }
            }
        }
    }
}

/// Check that a mutation path stays inside the working tree
pub(crate) fn validate_relative_path(path: &str) -> Result<(), ScheduleError> {
    let p = Path::new(path);
    let escapes = path.is_empty()
        || p.is_absolute()
        || p.components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ScheduleError::PlanValidation {
            message: format!("mutation path must be relative to the repository: {path:?}"),
        });
    }
    Ok(())
}

/// Tracks mutations and their consumption for one run
#[derive(Debug, Default)]
pub struct MutationRegistry {
    mutations: Vec<Mutation>,
    index: HashMap<String, usize>,
}

impl MutationRegistry {
    /// Build a registry, preserving the order of `specs`
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids, paths outside the working tree,
    /// empty replace patterns or regexes that do not compile.
    pub fn new(specs: impl IntoIterator<Item = MutationSpec>) -> Result<Self, ScheduleError> {
        let mut registry = Self::default();
        for spec in specs {
            validate_relative_path(&spec.path)?;
            if registry.index.contains_key(&spec.id) {
                return Err(ScheduleError::DuplicateMutation { id: spec.id });
            }
            registry
                .index
                .insert(spec.id.clone(), registry.mutations.len());
            registry.mutations.push(Mutation::new(spec)?);
        }
        Ok(registry)
    }

    /// Apply mutation `id` to `content`
    ///
    /// Returns the resulting content and whether it differs from the input.
    /// A changing application consumes the mutation. Consumed and unknown ids
    /// return the input unchanged without running the transform.
    pub fn apply(&mut self, id: &str, content: &str) -> (String, bool) {
        let (new_content, changed) = self.preview(id, content);
        if changed {
            self.mark_consumed(id);
        }
        (new_content, changed)
    }

    /// Run mutation `id` on `content` without consuming it
    ///
    /// Callers that must persist the result first pair this with
    /// [`MutationRegistry::mark_consumed`] once the edit is durable.
    #[must_use]
    pub fn preview(&self, id: &str, content: &str) -> (String, bool) {
        let Some(&idx) = self.index.get(id) else {
            debug!(id, "unknown mutation");
            return (content.to_string(), false);
        };
        let mutation = &self.mutations[idx];
        if mutation.consumed {
            trace!(id, "mutation already consumed");
            return (content.to_string(), false);
        }

        let new_content = mutation.transform(content);
        let changed = new_content != content;
        debug!(id, changed, "applied mutation");
        (new_content, changed)
    }

    /// Mark `id` consumed; unknown ids are ignored
    pub fn mark_consumed(&mut self, id: &str) {
        if let Some(&idx) = self.index.get(id) {
            self.mutations[idx].consumed = true;
        }
    }

    /// Stop offering `id` from [`MutationRegistry::next_for`] for the rest of
    /// the run
    ///
    /// Used for mutations that were dispatched but did not land. A retired
    /// mutation stays unconsumed.
    pub fn retire(&mut self, id: &str) {
        if let Some(&idx) = self.index.get(id) {
            let mutation = &mut self.mutations[idx];
            if !mutation.consumed && !mutation.retired {
                mutation.retired = true;
                debug!(id, "retired mutation");
            }
        }
    }

    /// Look up a mutation
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MutationSpec> {
        self.index.get(id).map(|&idx| &self.mutations[idx].spec)
    }

    /// Whether `id` has been consumed
    #[must_use]
    pub fn is_consumed(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|&idx| self.mutations[idx].consumed)
    }

    /// First dispatchable mutation owned by `role` or by nobody
    ///
    /// Owned mutations are preferred over unowned ones. Consumed and retired
    /// mutations are never offered.
    #[must_use]
    pub fn next_for(&self, role: Option<&str>) -> Option<&MutationSpec> {
        let pending = || self.mutations.iter().filter(|m| m.is_dispatchable());
        pending()
            .find(|m| role.is_some() && m.spec.owner.as_deref() == role)
            .or_else(|| pending().find(|m| m.spec.owner.is_none()))
            .map(|m| &m.spec)
    }

    /// Number of unconsumed mutations
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.mutations.iter().filter(|m| !m.consumed).count()
    }

    /// Number of mutations [`MutationRegistry::next_for`] may still offer
    #[must_use]
    pub fn dispatchable(&self) -> usize {
        self.mutations.iter().filter(|m| m.is_dispatchable()).count()
    }

    /// Total number of mutations
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the registry holds no mutations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
