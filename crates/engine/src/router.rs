// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workflow Router (C3): given the current step and an interpreted
//! intent, resolves the next step or signals completion (spec §4.2).

use serde_json::Value;
use turnflow_core::{
    step_kind_allows, Intent, RoutingError, StepId, StepRegistry, TransitionRule,
};

use crate::gate::Interpretation;

/// Result of routing a single turn.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub next_step_id: StepId,
    pub signal_completion: bool,
    pub reason: String,
    pub warning: Option<String>,
}

pub struct WorkflowRouter;

impl WorkflowRouter {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the next step from `current` given the interpreted intent.
    pub fn route(
        &self,
        registry: &StepRegistry,
        current: &StepId,
        interpretation: &Interpretation,
    ) -> Result<RouteOutcome, RoutingError> {
        let step_def = registry.get(current);
        let kind = step_def.map(|d| d.kind());

        if let Some(kind) = kind {
            if !step_kind_allows(kind, interpretation.intent) {
                return Err(RoutingError::DisallowedIntent {
                    step_id: current.to_string(),
                    step_kind: kind,
                    intent: interpretation.intent,
                });
            }
        }

        match interpretation.intent {
            Intent::Closing | Intent::Abort => Ok(RouteOutcome {
                next_step_id: current.clone(),
                signal_completion: true,
                reason: format!("{} signalled on {}", interpretation.intent, current),
                warning: None,
            }),

            Intent::Repeat => match step_def.and_then(|d| d.transitions.get(&Intent::Repeat)) {
                Some(rule) => {
                    self.resolve_rule(current, interpretation.intent, rule, interpretation, registry)
                }
                None => Ok(RouteOutcome {
                    next_step_id: current.clone(),
                    signal_completion: false,
                    reason: "repeat with no configured transition: staying on current step"
                        .to_string(),
                    warning: None,
                }),
            },

            Intent::Escalate => match step_def.and_then(|d| d.transitions.get(&Intent::Escalate)) {
                Some(TransitionRule::Direct { target: Some(t) }) => {
                    self.validated_direct(current, Intent::Escalate, t, registry)
                }
                _ => Err(RoutingError::MissingEscalateTransition {
                    step_id: current.to_string(),
                }),
            },

            Intent::Handoff => {
                let warning = (kind == Some(turnflow_core::StepKind::Initial)).then(|| {
                    format!("handoff emitted from initial step '{current}'")
                });
                match step_def.and_then(|d| d.transitions.get(&Intent::Handoff)) {
                    Some(rule) => {
                        let mut outcome = self.resolve_rule(
                            current,
                            Intent::Handoff,
                            rule,
                            interpretation,
                            registry,
                        )?;
                        if outcome.warning.is_none() {
                            outcome.warning = warning;
                        }
                        Ok(outcome)
                    }
                    None => Ok(RouteOutcome {
                        next_step_id: current.clone(),
                        signal_completion: true,
                        reason: "handoff with no configured transition defaults to completion"
                            .to_string(),
                        warning: Some(warning.unwrap_or_else(|| {
                            "handoff with no configured transition defaults to completion"
                                .to_string()
                        })),
                    }),
                }
            }

            Intent::Jump => {
                let target = interpretation
                    .target
                    .as_ref()
                    .ok_or_else(|| RoutingError::MissingJumpTarget {
                        step_id: current.to_string(),
                    })?;
                let target = StepId::new(target.clone());
                if !registry.contains(&target) {
                    return Err(RoutingError::UndefinedTarget {
                        step_id: current.to_string(),
                        intent: Intent::Jump,
                        target: target.to_string(),
                    });
                }
                Ok(RouteOutcome {
                    next_step_id: target,
                    signal_completion: false,
                    reason: format!("jump target from {current}"),
                    warning: None,
                })
            }

            Intent::Next => match step_def.and_then(|d| d.transitions.get(&Intent::Next)) {
                Some(rule) => self.resolve_rule(current, Intent::Next, rule, interpretation, registry),
                None => self.default_transition(current, registry),
            },
        }
    }

    fn resolve_rule(
        &self,
        current: &StepId,
        intent: Intent,
        rule: &TransitionRule,
        interpretation: &Interpretation,
        registry: &StepRegistry,
    ) -> Result<RouteOutcome, RoutingError> {
        match rule {
            TransitionRule::Direct { target: Some(t) } => Ok(RouteOutcome {
                next_step_id: t.clone(),
                signal_completion: false,
                reason: format!("{intent} transition from {current}"),
                warning: None,
            }),
            TransitionRule::Direct { target: None } => Ok(RouteOutcome {
                next_step_id: current.clone(),
                signal_completion: true,
                reason: format!("{intent} transition from {current} is terminal"),
                warning: None,
            }),
            TransitionRule::Conditional { condition, targets } => {
                let value = interpretation
                    .handoff
                    .as_ref()
                    .and_then(|h| h.get(condition))
                    .map(stringify_condition_value)
                    .unwrap_or_else(|| "default".to_string());

                let selected = targets
                    .get(&value)
                    .or_else(|| targets.get("default"))
                    .ok_or_else(|| RoutingError::UndefinedTarget {
                        step_id: current.to_string(),
                        intent,
                        target: value.clone(),
                    })?;

                match selected {
                    // Conditional targets are only named statically in the
                    // document, not checked at registry build time (spec
                    // §6: "resolved lazily and may raise at routing time if
                    // absent") — validate the branch actually selected.
                    Some(target) => {
                        if !registry.contains(target) {
                            return Err(RoutingError::UndefinedTarget {
                                step_id: current.to_string(),
                                intent,
                                target: target.to_string(),
                            });
                        }
                        Ok(RouteOutcome {
                            next_step_id: target.clone(),
                            signal_completion: false,
                            reason: format!(
                                "conditional {intent} transition from {current} on '{condition}' = '{value}'"
                            ),
                            warning: None,
                        })
                    }
                    None => Ok(RouteOutcome {
                        next_step_id: current.clone(),
                        signal_completion: true,
                        reason: format!(
                            "conditional {intent} transition from {current} on '{condition}' = '{value}' is terminal"
                        ),
                        warning: None,
                    }),
                }
            }
        }
    }

    fn validated_direct(
        &self,
        current: &StepId,
        intent: Intent,
        target: &StepId,
        registry: &StepRegistry,
    ) -> Result<RouteOutcome, RoutingError> {
        if !registry.contains(target) {
            return Err(RoutingError::UndefinedTarget {
                step_id: current.to_string(),
                intent,
                target: target.to_string(),
            });
        }
        Ok(RouteOutcome {
            next_step_id: target.clone(),
            signal_completion: false,
            reason: format!("{intent} transition from {current}"),
            warning: None,
        })
    }

    /// No rule matched for `next`: try `initial.` → `continuation.`
    /// (spec §4.2 step 8), else signal completion.
    fn default_transition(
        &self,
        current: &StepId,
        registry: &StepRegistry,
    ) -> Result<RouteOutcome, RoutingError> {
        if current.phase() == "initial" {
            if let Some(candidate) = current.with_phase("continuation") {
                if registry.contains(&candidate) {
                    return Ok(RouteOutcome {
                        next_step_id: candidate,
                        signal_completion: false,
                        reason: format!("default initial -> continuation fallback from {current}"),
                        warning: None,
                    });
                }
            }
        }
        Ok(RouteOutcome {
            next_step_id: current.clone(),
            signal_completion: true,
            reason: format!("no transition for next at {current}: signalling completion"),
            warning: None,
        })
    }
}

impl Default for WorkflowRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn stringify_condition_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Null => "default".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
