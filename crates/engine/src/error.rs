// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level errors: orchestration failures that wrap the structural
//! `turnflow_core` errors (spec §7).

use thiserror::Error;
use turnflow_core::{GateInterpretationError, RoutingError};

use crate::ports::DispatchError;

/// Errors surfaced by the [`crate::FlowOrchestrator`].
///
/// `Gate`/`Routing` are structural workflow errors (spec §7: "end the run
/// immediately and surface to the caller"); `Dispatch` wraps a dispatch
/// failure that exhausted retries; `MaxIterations` and `Cancelled` are
/// runtime-level terminations. A prompt-resolution failure never reaches
/// this type: the orchestrator always falls back to a built-in prompt and
/// logs a warning instead of propagating it (spec §4.5 step 2).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("gate interpretation failed: {0}")]
    Gate(#[from] GateInterpretationError),

    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("dispatch failed after exhausting retries: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("no current step: iteration {iteration} has no router-assigned stepId")]
    NoCurrentStep { iteration: u32 },

    #[error("step '{step_id}' selected for iteration {iteration} is not present in the registry")]
    UnknownStep { step_id: String, iteration: u32 },

    #[error("no entry step configured for completion type '{completion_type}'")]
    NoEntryStep { completion_type: String },

    #[error("agent exceeded max iterations ({max_iterations})")]
    AgentMaxIterations { max_iterations: u32 },

    #[error("agent run was cancelled: {reason}")]
    AgentCancelled { reason: String },

    #[error("orchestrator is not idle; run() may only be called once per instance")]
    AlreadyRan,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
