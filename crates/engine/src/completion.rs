// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Completion Chain (C4): detects AI-declared completion and gates
//! closure through a validator (spec §4.3).

use async_trait::async_trait;
use serde_json::Value;
use turnflow_core::{CompletionConditions, IterationSummary, StepId, StepRegistry};

/// What the Completion Chain hands a [`CompletionValidator`] to decide on.
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub structured_output: Option<&'a Value>,
    pub conditions: Option<&'a CompletionConditions>,
    pub output_schema: Option<&'a Value>,
}

/// Result of a closure validation attempt.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub retry_prompt: Option<String>,
}

/// Gates closure steps. Callers provide an implementation tailored to
/// their closure semantics; [`DefaultCompletionValidator`] is wired in
/// automatically when none is supplied.
#[async_trait]
pub trait CompletionValidator: Send + Sync {
    async fn validate(&self, request: ValidationRequest<'_>) -> ValidationOutcome;
}

/// Checks the standard `validation` record in the structured output:
/// `git_clean` and `type_check_passed` are required booleans; `tests_passed`,
/// `lint_passed`, `format_check_passed` only fail when explicitly `false`
/// (spec §4.3, "A default validator implementation").
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompletionValidator;

const REQUIRED_CHECKS: &[&str] = &["git_clean", "type_check_passed"];
const OPTIONAL_CHECKS: &[&str] = &["tests_passed", "lint_passed", "format_check_passed"];

#[async_trait]
impl CompletionValidator for DefaultCompletionValidator {
    async fn validate(&self, request: ValidationRequest<'_>) -> ValidationOutcome {
        let validation = request
            .structured_output
            .and_then(|v| v.get("validation"))
            .and_then(Value::as_object);

        let mut unmet = Vec::new();

        for key in REQUIRED_CHECKS {
            let passed = validation
                .and_then(|v| v.get(*key))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !passed {
                unmet.push(format!("{key} is false"));
            }
        }

        for key in OPTIONAL_CHECKS {
            if let Some(false) = validation.and_then(|v| v.get(*key)).and_then(Value::as_bool) {
                unmet.push(format!("{key} is false"));
            }
        }

        if unmet.is_empty() {
            ValidationOutcome {
                valid: true,
                retry_prompt: None,
            }
        } else {
            ValidationOutcome {
                valid: false,
                retry_prompt: Some(format!(
                    "Closure validation failed: {}",
                    unmet.join(", ")
                )),
            }
        }
    }
}

/// Detects AI-declared completion and validates closure (spec §4.3).
pub struct CompletionChain<V> {
    validator: V,
}

impl CompletionChain<DefaultCompletionValidator> {
    pub fn new() -> Self {
        Self {
            validator: DefaultCompletionValidator,
        }
    }
}

impl Default for CompletionChain<DefaultCompletionValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CompletionValidator> CompletionChain<V> {
    pub fn with_validator(validator: V) -> Self {
        Self { validator }
    }

    /// `summary.structuredOutput.next_action` is a mapping and
    /// `next_action.action ∈ {closing, complete}` (case-insensitive).
    /// `status: "completed"` alone never qualifies (spec §9 open question).
    pub fn has_ai_completion_declaration(&self, summary: &IterationSummary) -> bool {
        let Some(output) = &summary.structured_output else {
            return false;
        };
        let Some(next_action) = output.get("next_action").and_then(Value::as_object) else {
            return false;
        };
        let Some(action) = next_action.get("action").and_then(Value::as_str) else {
            return false;
        };
        matches!(action.to_ascii_lowercase().as_str(), "closing" | "complete")
    }

    /// Resolve `registry.completionSteps["closure." + completion_type]`,
    /// falling back to `"closure." + completion_type`. In the absence of a
    /// registry, `"closure.issue"` (spec §4.3, "CompletionStep resolution").
    pub fn completion_step_id(
        &self,
        registry: Option<&StepRegistry>,
        completion_type: &str,
    ) -> StepId {
        match registry {
            Some(registry) => registry.completion_step_id(completion_type),
            None => StepId::new("closure.issue"),
        }
    }

    /// Validate closure for `step_id`. An unknown step (no closure entry
    /// in the registry) is a no-op pass.
    pub async fn validate(
        &self,
        registry: &StepRegistry,
        step_id: &StepId,
        summary: &IterationSummary,
    ) -> ValidationOutcome {
        let Some(step_def) = registry.get(step_id) else {
            return ValidationOutcome {
                valid: true,
                retry_prompt: None,
            };
        };

        self.validator
            .validate(ValidationRequest {
                structured_output: summary.structured_output.as_ref(),
                conditions: step_def.completion_conditions.as_ref(),
                output_schema: step_def.output_schema.as_ref(),
            })
            .await
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
