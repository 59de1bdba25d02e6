// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative step definitions.

use crate::id::StepId;
use crate::intent::{Intent, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the Gate Interpreter should parse a step's structured reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredGateConfig {
    pub allowed_intents: Vec<Intent>,
    #[serde(default)]
    pub intent_field: Option<String>,
    #[serde(default)]
    pub target_field: Option<String>,
    #[serde(default)]
    pub handoff_fields: Vec<String>,
    #[serde(default)]
    pub fallback_intent: Option<Intent>,
    #[serde(default)]
    pub intent_schema_ref: Option<String>,
}

/// One step's routing rule for a given intent.
///
/// Tagged sum type per spec §9's design note, rather than an open
/// structural shape: a rule is either a direct target or a condition that
/// selects among several targets by looking up a key in the handoff
/// dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionRule {
    /// `target: None` is terminal (implies `signalCompletion = true`).
    Direct { target: Option<StepId> },
    /// `condition` names a key in the handoff dictionary; its stringified
    /// value selects a target from `targets`, falling back to
    /// `targets["default"]`. A selected `None` target is terminal.
    Conditional {
        condition: String,
        targets: HashMap<String, Option<StepId>>,
    },
}

/// Declarative validation requirements checked only at closure steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionConditions {
    /// Keys that must resolve to `true` in the `validation` record on the
    /// structured output. Matches the default validator's `git_clean` /
    /// `type_check_passed` required-booleans behaviour (spec §4.3).
    #[serde(default)]
    pub required: Vec<String>,
    /// Keys that only fail the check when explicitly present and `false`
    /// (e.g. `tests_passed`, `lint_passed`, `format_check_passed`).
    #[serde(default)]
    pub optional: Vec<String>,
}

/// What a closure step does when validation fails and iteration budget
/// allows another attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnFailureConfig {
    #[serde(default)]
    pub retry_prompt_prefix: Option<String>,
}

/// Declarative record in the Step Registry (spec §3, `StepDefinition`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub step_id: StepId,
    pub name: String,
    #[serde(default)]
    pub fallback_key: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(default)]
    pub uv_variables: Vec<String>,
    #[serde(default)]
    pub structured_gate: Option<StructuredGateConfig>,
    #[serde(default)]
    pub transitions: HashMap<Intent, TransitionRule>,
    #[serde(default)]
    pub completion_conditions: Option<CompletionConditions>,
    #[serde(default)]
    pub on_failure: Option<OnFailureConfig>,
    #[serde(default)]
    pub output_schema: Option<serde_json::Value>,
}

impl StepDefinition {
    /// Kind derived from this step's id phase (spec §3: "stepKind: derived
    /// from phase").
    pub fn kind(&self) -> StepKind {
        StepKind::from_phase(self.step_id.phase())
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
