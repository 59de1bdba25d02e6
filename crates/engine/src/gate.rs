// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Gate Interpreter (C2): extracts `{intent, target, handoff, reason}`
//! from a step's raw structured model output (spec §4.1).

use serde_json::Value;
use turnflow_core::{GateInterpretationError, Intent, StepDefinition};

/// Result of interpreting a structured reply against a step's gate
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct Interpretation {
    pub intent: Intent,
    pub target: Option<String>,
    pub handoff: Option<serde_json::Map<String, Value>>,
    pub reason: Option<String>,
    pub used_fallback: bool,
    pub inferred: bool,
}

/// Fixed ordered list of fallback locations probed for an intent string
/// when `structuredGate.intentField` is unset (spec §4.1 step 2).
const FALLBACK_INTENT_PATHS: &[&str] = &[
    "next_action.action",
    "action",
    "status",
    "next_action.intent",
    "intent",
];

/// Fallback locations probed for a jump target (spec §4.1 step 5).
const FALLBACK_TARGET_PATHS: &[&str] = &["target", "details.target", "jump.target"];

/// Fallback locations probed for a human-readable reason (spec §4.1 step 7).
const FALLBACK_REASON_PATHS: &[&str] = &["next_action.reason", "reason", "explanation"];

/// Resolve a dotted path against a JSON value.
///
/// Splits `path` on `.`; at each segment descends into an object property
/// or, if the current value is an array and the segment parses as a
/// non-negative integer, into that index. Missing intermediates or
/// non-container values yield `None` (spec §4.1, "Dotted-path rules").
pub fn resolve_dotted_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// The last dotted segment of a path, used as the handoff key (spec §4.1
/// step 6: "Keys in the returned handoff are the last segment of each
/// path").
fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

pub struct GateInterpreter;

impl GateInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret `output` against `step_def`'s gate configuration.
    pub fn interpret(
        &self,
        output: &Value,
        step_def: &StepDefinition,
    ) -> Result<Interpretation, GateInterpretationError> {
        let Some(gate) = &step_def.structured_gate else {
            return Ok(Interpretation {
                intent: Intent::Next,
                used_fallback: true,
                reason: Some("No structuredGate configuration".to_string()),
                ..Default::default()
            });
        };

        let (candidate, inferred) = match &gate.intent_field {
            Some(field) => (
                resolve_dotted_path(output, field).and_then(as_str),
                false,
            ),
            None => {
                let mut found = None;
                for path in FALLBACK_INTENT_PATHS {
                    if let Some(s) = resolve_dotted_path(output, path).and_then(as_str) {
                        found = Some(s);
                        break;
                    }
                }
                (found, true)
            }
        };

        let normalized = candidate.and_then(Intent::normalize);

        let intent = match normalized {
            Some(intent) if gate.allowed_intents.contains(&intent) => intent,
            _ => {
                if let Some(fallback) = gate.fallback_intent {
                    fallback
                } else if gate.allowed_intents.contains(&Intent::Next) {
                    Intent::Next
                } else {
                    return Err(GateInterpretationError {
                        step_id: step_def.step_id.to_string(),
                        allowed_intents: gate.allowed_intents.clone(),
                    });
                }
            }
        };

        let target = if intent == Intent::Jump {
            match &gate.target_field {
                Some(field) => resolve_dotted_path(output, field)
                    .and_then(as_str)
                    .map(str::to_string),
                None => FALLBACK_TARGET_PATHS
                    .iter()
                    .find_map(|p| resolve_dotted_path(output, p).and_then(as_str))
                    .map(str::to_string),
            }
        } else {
            None
        };

        let mut handoff = serde_json::Map::new();
        for path in &gate.handoff_fields {
            if let Some(value) = resolve_dotted_path(output, path) {
                handoff.insert(last_segment(path).to_string(), value.clone());
            }
        }
        let handoff = if handoff.is_empty() { None } else { Some(handoff) };

        let reason = FALLBACK_REASON_PATHS
            .iter()
            .find_map(|p| resolve_dotted_path(output, p).and_then(as_str))
            .map(str::to_string);

        Ok(Interpretation {
            intent,
            target,
            handoff,
            reason,
            used_fallback: false,
            inferred,
        })
    }
}

impl Default for GateInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
