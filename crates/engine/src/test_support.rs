// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapter implementations for deterministic engine tests, grounded
//! on the teacher's `FakeAgentAdapter` call-recording pattern.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use turnflow_core::{IterationSummary, StepId};

use crate::completion::{CompletionValidator, ValidationOutcome, ValidationRequest};
use crate::ports::{
    DispatchContext, DispatchError, Dispatcher, Logger, PromptResolution, PromptResolveError,
    PromptResolver,
};

/// One recorded call to [`FakeDispatcher::run`].
#[derive(Debug, Clone)]
pub struct DispatchCall {
    pub step_id: StepId,
    pub iteration: u32,
    pub prompt: String,
}

/// Scripted [`Dispatcher`] double. Queue responses with
/// [`FakeDispatcher::push_ok`]/[`FakeDispatcher::push_err`]; each call to
/// `run` pops the next queued response in order. An empty queue returns a
/// bare successful [`IterationSummary`] so tests that don't care about
/// dispatch content don't need to script every turn.
#[derive(Clone, Default)]
pub struct FakeDispatcher {
    inner: Arc<Mutex<FakeDispatcherState>>,
}

#[derive(Default)]
struct FakeDispatcherState {
    responses: VecDeque<Result<IterationSummary, DispatchError>>,
    calls: Vec<DispatchCall>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, summary: IterationSummary) {
        self.inner.lock().responses.push_back(Ok(summary));
    }

    pub fn push_err(&self, error: DispatchError) {
        self.inner.lock().responses.push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn run(
        &self,
        prompt: &str,
        ctx: &DispatchContext<'_>,
    ) -> Result<IterationSummary, DispatchError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DispatchCall {
            step_id: ctx.step_id.clone(),
            iteration: ctx.iteration,
            prompt: prompt.to_string(),
        });
        inner.responses.pop_front().unwrap_or(Ok(IterationSummary {
            iteration: ctx.iteration,
            ..Default::default()
        }))
    }
}

/// Scripted [`PromptResolver`] double: returns a fixed template per step
/// unless overridden, and records every call including adaptation
/// overrides (spec §4.5 step 2).
#[derive(Clone, Default)]
pub struct FakePromptResolver {
    inner: Arc<Mutex<FakePromptResolverState>>,
}

#[derive(Default)]
struct FakePromptResolverState {
    templates: HashMap<String, String>,
    failures: HashMap<String, PromptResolveError>,
    calls: Vec<(StepId, Option<HashMap<String, String>>)>,
}

impl FakePromptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_template(&self, step_id: &str, content: impl Into<String>) {
        self.inner
            .lock()
            .templates
            .insert(step_id.to_string(), content.into());
    }

    pub fn set_failure(&self, step_id: &str, error: PromptResolveError) {
        self.inner
            .lock()
            .failures
            .insert(step_id.to_string(), error);
    }

    pub fn calls(&self) -> Vec<(StepId, Option<HashMap<String, String>>)> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl PromptResolver for FakePromptResolver {
    async fn resolve(
        &self,
        step_id: &StepId,
        _vars: &HashMap<String, String>,
        overrides: Option<&HashMap<String, String>>,
    ) -> Result<PromptResolution, PromptResolveError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push((step_id.clone(), overrides.cloned()));
        if let Some(err) = inner.failures.get(step_id.as_str()) {
            return Err(err.clone());
        }
        let content = inner
            .templates
            .get(step_id.as_str())
            .cloned()
            .unwrap_or_else(|| format!("prompt for {step_id}"));
        Ok(PromptResolution {
            content,
            source: "fake".to_string(),
            prompt_path: None,
        })
    }
}

/// Scripted [`CompletionValidator`] double: returns a fixed outcome,
/// defaulting to `valid: true`. Records every request it was handed.
#[derive(Clone)]
pub struct FakeCompletionValidator {
    inner: Arc<Mutex<FakeValidatorState>>,
}

struct FakeValidatorState {
    outcome: ValidationOutcome,
    calls: usize,
}

impl Default for FakeCompletionValidator {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeValidatorState {
                outcome: ValidationOutcome {
                    valid: true,
                    retry_prompt: None,
                },
                calls: 0,
            })),
        }
    }
}

impl FakeCompletionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, outcome: ValidationOutcome) {
        self.inner.lock().outcome = outcome;
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls
    }
}

#[async_trait]
impl CompletionValidator for FakeCompletionValidator {
    async fn validate(&self, _request: ValidationRequest<'_>) -> ValidationOutcome {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.outcome.clone()
    }
}

/// Recording [`Logger`] double: stores every call for assertions instead
/// of forwarding to `tracing`.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    inner: Arc<Mutex<Vec<(String, String, Vec<(String, String)>)>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String, Vec<(String, String)>)> {
        self.inner.lock().clone()
    }

    pub fn messages_at_level(&self, level: &str) -> Vec<String> {
        self.inner
            .lock()
            .iter()
            .filter(|(l, _, _)| l == level)
            .map(|(_, msg, _)| msg.clone())
            .collect()
    }

    fn record(&self, level: &str, msg: &str, fields: &[(&str, String)]) {
        self.inner.lock().push((
            level.to_string(),
            msg.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, msg: &str, fields: &[(&str, String)]) {
        self.record("debug", msg, fields);
    }

    fn info(&self, msg: &str, fields: &[(&str, String)]) {
        self.record("info", msg, fields);
    }

    fn warn(&self, msg: &str, fields: &[(&str, String)]) {
        self.record("warn", msg, fields);
    }

    fn error(&self, msg: &str, fields: &[(&str, String)]) {
        self.record("error", msg, fields);
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
