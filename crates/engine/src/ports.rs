// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency interfaces the core talks through (spec §6).
//!
//! Prompt template rendering, file lookup, and the model-invocation
//! transport itself are out of scope for this crate; callers supply
//! implementations of these traits.

use async_trait::async_trait;
use std::collections::HashMap;
use turnflow_core::{IterationSummary, StepId};

/// Invokes the external model for one turn. May fail; failures are run
/// through the Retry Executor by the orchestrator.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn run(
        &self,
        prompt: &str,
        ctx: &DispatchContext<'_>,
    ) -> Result<IterationSummary, DispatchError>;
}

/// Everything the dispatcher needs to know about the turn it's about to run.
#[derive(Debug, Clone)]
pub struct DispatchContext<'a> {
    pub step_id: &'a StepId,
    pub iteration: u32,
}

/// Error surfaced by a [`Dispatcher`]. Carries only a message; the Retry
/// Executor's [`crate::ErrorClassifier`] is responsible for turning this
/// into a [`turnflow_core::ClassifiedError`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("dispatch failed: {0}")]
pub struct DispatchError(pub String);

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Resolved prompt content plus provenance, returned by a
/// [`PromptResolver`].
#[derive(Debug, Clone)]
pub struct PromptResolution {
    pub content: String,
    pub source: String,
    pub prompt_path: Option<String>,
}

/// Resolves a step's prompt template given its declared variables and an
/// optional adaptation override (spec §4.5 step 2, §6).
#[async_trait]
pub trait PromptResolver: Send + Sync {
    async fn resolve(
        &self,
        step_id: &StepId,
        vars: &HashMap<String, String>,
        overrides: Option<&HashMap<String, String>>,
    ) -> Result<PromptResolution, PromptResolveError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("prompt resolution failed for step '{step_id}': {message}")]
pub struct PromptResolveError {
    pub step_id: String,
    pub message: String,
}

/// Thin logging contract (spec §6). The production implementation below
/// forwards directly to `tracing`, matching the teacher's own call sites,
/// which invoke `tracing::info!`/`debug!`/`warn!`/`error!` macros directly
/// rather than going through a boxed trait object.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str, fields: &[(&str, String)]);
    fn info(&self, msg: &str, fields: &[(&str, String)]);
    fn warn(&self, msg: &str, fields: &[(&str, String)]);
    fn error(&self, msg: &str, fields: &[(&str, String)]);
}

fn format_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default, production [`Logger`] backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::debug!(fields = %format_fields(fields), "{msg}");
    }

    fn info(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::info!(fields = %format_fields(fields), "{msg}");
    }

    fn warn(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::warn!(fields = %format_fields(fields), "{msg}");
    }

    fn error(&self, msg: &str, fields: &[(&str, String)]) {
        tracing::error!(fields = %format_fields(fields), "{msg}");
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
