// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run step context and turn summaries.

use crate::id::StepId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a single turn of interaction with the external model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationSummary {
    pub iteration: u32,
    #[serde(default)]
    pub assistant_responses: Vec<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub structured_output: Option<serde_json::Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl IterationSummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Per-run mapping of `stepId -> recorded output`.
///
/// Last write wins per step; the context is retained for the life of the
/// run and destroyed at run end (spec §3, Lifecycle).
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    entries: HashMap<StepId, serde_json::Map<String, serde_json::Value>>,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (overwriting) a step's output. Merges `structuredOutput`,
    /// `iteration`, `sessionId`, and an `hasErrors`/`errorCount` pair into
    /// the entry, per spec §4.5 step 5.
    pub fn record(&mut self, step_id: StepId, summary: &IterationSummary) {
        let mut entry = serde_json::Map::new();
        if let Some(serde_json::Value::Object(structured)) = &summary.structured_output {
            entry.extend(structured.clone());
        } else if let Some(other) = &summary.structured_output {
            entry.insert("structuredOutput".to_string(), other.clone());
        }
        entry.insert("iteration".to_string(), serde_json::json!(summary.iteration));
        if let Some(session_id) = &summary.session_id {
            entry.insert("sessionId".to_string(), serde_json::json!(session_id));
        }
        entry.insert("hasErrors".to_string(), serde_json::json!(summary.has_errors()));
        entry.insert(
            "errorCount".to_string(),
            serde_json::json!(summary.errors.len()),
        );
        self.entries.insert(step_id, entry);
    }

    /// Merge a handoff dictionary into a step's entry (spec §4.5 step 9:
    /// "merge handoff into StepContext"). Last write wins per key.
    pub fn merge_handoff(
        &mut self,
        step_id: StepId,
        handoff: &serde_json::Map<String, serde_json::Value>,
    ) {
        let entry = self.entries.entry(step_id).or_default();
        entry.extend(handoff.clone());
    }

    pub fn get(&self, step_id: &StepId) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.entries.get(step_id)
    }

    /// Look up a single field within a step's recorded entry.
    pub fn field(&self, step_id: &StepId, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(step_id).and_then(|e| e.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
