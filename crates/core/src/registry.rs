// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Step Registry (C1): an immutable, declarative store of step
//! definitions, loaded once at run start.

use crate::id::StepId;
use crate::step::StepDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The abstract, JSON-compatible registry document shape from spec §6.
///
/// turnflow never reads a file itself — a caller deserializes whatever
/// external format (JSON, YAML, …) into this struct, or builds one
/// programmatically, then converts it into a [`StepRegistry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub agent_id: String,
    pub version: String,
    pub steps: HashMap<StepId, StepDefinition>,
    #[serde(default)]
    pub entry_step: Option<StepId>,
    #[serde(default)]
    pub entry_step_mapping: HashMap<String, StepId>,
    #[serde(default)]
    pub completion_steps: HashMap<String, StepId>,
}

/// Error produced while validating a [`RegistryDocument`] into a
/// [`StepRegistry`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("step '{step}' has transition target '{target}' for intent '{intent}' that does not exist in the registry")]
    UndefinedTransitionTarget {
        step: String,
        intent: String,
        target: String,
    },
    #[error("entry_step '{0}' does not exist in the registry")]
    UndefinedEntryStep(String),
    #[error("entry_step_mapping['{completion_type}'] = '{target}' does not exist in the registry")]
    UndefinedEntryStepMapping {
        completion_type: String,
        target: String,
    },
    #[error("completion_steps['{key}'] = '{target}' does not exist in the registry")]
    UndefinedCompletionStep { key: String, target: String },
}

/// Ordered, immutable set of [`StepDefinition`]s plus entry/completion
/// routing tables (spec §3, `StepRegistry`).
///
/// A [`StepRegistry`] is always valid with respect to its statically
/// resolvable targets: [`StepRegistry::build`] is the only constructor and
/// it rejects any dangling direct transition target, entry step, or
/// completion step eagerly, per invariant 5 ("Every jump.target and every
/// transition target... must resolve to a step that exists in the
/// registry before it is used to advance"). Conditional transition targets
/// are named only in a `targets` map keyed by a handoff-driven lookup, so
/// which branch applies isn't known until route time; per spec §6 those
/// are validated lazily by [`crate::step::TransitionRule`]'s consumer (the
/// Workflow Router) instead of here, so a registry with an unreachable
/// dangling conditional branch still loads.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: HashMap<StepId, StepDefinition>,
    entry_step: Option<StepId>,
    entry_step_mapping: HashMap<String, StepId>,
    completion_steps: HashMap<String, StepId>,
}

impl StepRegistry {
    /// Validate a [`RegistryDocument`] and build an immutable registry
    /// snapshot from it.
    ///
    /// Only statically-known targets are checked eagerly here: direct
    /// transition targets, entry steps, and completion steps. Conditional
    /// transition targets are named only in a `targets` map keyed by a
    /// handoff-driven value, so which one applies isn't known until route
    /// time; per spec §6, those are "resolved lazily and may raise at
    /// routing time if absent" rather than rejected here, even if a branch
    /// that would never be selected at runtime is dangling.
    pub fn build(doc: RegistryDocument) -> Result<StepRegistry, RegistryError> {
        for (step_id, def) in &doc.steps {
            for (intent, rule) in &def.transitions {
                if let crate::step::TransitionRule::Direct { target: Some(t) } = rule {
                    if !doc.steps.contains_key(t) {
                        return Err(RegistryError::UndefinedTransitionTarget {
                            step: step_id.to_string(),
                            intent: intent.to_string(),
                            target: t.to_string(),
                        });
                    }
                }
            }
        }

        if let Some(entry) = &doc.entry_step {
            if !doc.steps.contains_key(entry) {
                return Err(RegistryError::UndefinedEntryStep(entry.to_string()));
            }
        }
        for (completion_type, target) in &doc.entry_step_mapping {
            if !doc.steps.contains_key(target) {
                return Err(RegistryError::UndefinedEntryStepMapping {
                    completion_type: completion_type.clone(),
                    target: target.to_string(),
                });
            }
        }
        for (key, target) in &doc.completion_steps {
            if !doc.steps.contains_key(target) {
                return Err(RegistryError::UndefinedCompletionStep {
                    key: key.clone(),
                    target: target.to_string(),
                });
            }
        }

        Ok(StepRegistry {
            steps: doc.steps,
            entry_step: doc.entry_step,
            entry_step_mapping: doc.entry_step_mapping,
            completion_steps: doc.completion_steps,
        })
    }

    pub fn get(&self, step_id: &StepId) -> Option<&StepDefinition> {
        self.steps.get(step_id)
    }

    pub fn contains(&self, step_id: &StepId) -> bool {
        self.steps.contains_key(step_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Entry step for iteration 1, per completion type if an
    /// `entry_step_mapping` is configured, else the flat `entry_step`.
    pub fn entry_step_for(&self, completion_type: &str) -> Option<&StepId> {
        self.entry_step_mapping
            .get(completion_type)
            .or(self.entry_step.as_ref())
    }

    /// Resolve `registry.completionSteps["closure." + completion_type]`,
    /// falling back to the conventional `"closure." + completion_type`
    /// name (spec §4.3, `getCompletionStepId`).
    pub fn completion_step_id(&self, completion_type: &str) -> StepId {
        let key = format!("closure.{completion_type}");
        self.completion_steps
            .get(&key)
            .cloned()
            .unwrap_or_else(|| StepId::new(key))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
