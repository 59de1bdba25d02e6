// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural errors: gate interpretation and routing failures (spec §7).
//!
//! Both are fatal and non-recoverable — the run ends and the error
//! surfaces to the caller (see `turnflow_engine::error::RuntimeError` for
//! how they fold into the engine-level error type).

use crate::intent::{Intent, StepKind};
use thiserror::Error;

/// No valid intent could be extracted and no fallback was configured
/// (spec §4.1 step 4).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("no valid intent could be extracted for step '{step_id}' (allowed intents: {allowed_intents:?})")]
pub struct GateInterpretationError {
    pub step_id: String,
    pub allowed_intents: Vec<Intent>,
}

/// An unknown transition target, or an intent disallowed for the current
/// step's kind (spec §4.2 step 1, and invariant 4/5).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RoutingError {
    #[error("intent '{intent}' is not allowed for step kind '{step_kind}' at step '{step_id}'")]
    DisallowedIntent {
        step_id: String,
        step_kind: StepKind,
        intent: Intent,
    },
    #[error("transition target '{target}' for intent '{intent}' at step '{step_id}' does not exist in the registry")]
    UndefinedTarget {
        step_id: String,
        intent: Intent,
        target: String,
    },
    #[error("'escalate' emitted at step '{step_id}' has no statically-defined transitions.escalate target")]
    MissingEscalateTransition { step_id: String },
    #[error("'jump' emitted at step '{step_id}' with no target")]
    MissingJumpTarget { step_id: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
