// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Flow Orchestrator (C6): drives the iteration loop, owns step
//! context, and emits boundary events (spec §4.5).
//!
//! Modeled explicitly as a state machine (spec §9, "State machine"):
//! `Idle -> Running -> (AwaitingDispatch <-> Transitioning)* -> Terminating`.
//! `run`/`run_cancellable` may each be called only once per orchestrator
//! instance; a second call is rejected rather than silently re-entering
//! the loop.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use turnflow_core::{
    Clock, IterationSummary, RetryPolicy, StepContext, StepId, StepKind, StepRegistry, SystemClock,
};

use crate::completion::{CompletionChain, CompletionValidator, DefaultCompletionValidator};
use crate::error::RuntimeError;
use crate::events::{BoundaryHookPayload, EventBus, EventPayload};
use crate::gate::GateInterpreter;
use crate::ports::{DispatchContext, Dispatcher, Logger, PromptResolver, TracingLogger};
use crate::retry_executor::{execute_with_retry, DefaultErrorClassifier};
use crate::router::WorkflowRouter;

/// Lifecycle state of a [`FlowOrchestrator`] (spec §9, "State machine").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Running,
    AwaitingDispatch,
    Transitioning,
    Terminating,
}

/// `defaultClosureAction` configuration option (spec §6, Configuration
/// surface). Anything other than `Close` triggers an adaptation override
/// in prompt resolution (spec §4.5 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosureAction {
    Close,
    LabelOnly,
    LabelAndClose,
    CommentOnly,
}

impl ClosureAction {
    pub fn is_default(&self) -> bool {
        matches!(self, ClosureAction::Close)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClosureAction::Close => "close",
            ClosureAction::LabelOnly => "label-only",
            ClosureAction::LabelAndClose => "label-and-close",
            ClosureAction::CommentOnly => "comment-only",
        }
    }
}

impl Default for ClosureAction {
    fn default() -> Self {
        ClosureAction::Close
    }
}

/// Per-run agent-level policy knobs (spec §6, Configuration surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub completion_type: String,
    pub max_iterations: u32,
    #[serde(default)]
    pub closure_action: ClosureAction,
    #[serde(default)]
    pub retry_policy: RetryPolicy,
}

impl AgentConfig {
    pub fn new(completion_type: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            completion_type: completion_type.into(),
            max_iterations,
            closure_action: ClosureAction::default(),
            retry_policy: RetryPolicy::default_policy(),
        }
    }
}

/// Outcome of a completed (or terminated) run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub completed: bool,
    pub iterations: u32,
    pub final_step_id: Option<StepId>,
    pub reason: String,
    pub last_summary: Option<IterationSummary>,
}

fn builtin_fallback_prompt(step_id: &StepId) -> String {
    format!("Continue the workflow at step '{step_id}'.")
}

/// Flatten the accumulated [`StepContext`] into a flat variable map for
/// prompt resolution, picking up only the names a step declares it needs.
fn collect_vars(ctx: &StepContext, step_ids: &[StepId], wanted: &[String]) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for step_id in step_ids {
        let Some(entry) = ctx.get(step_id) else {
            continue;
        };
        for name in wanted {
            if vars.contains_key(name) {
                continue;
            }
            if let Some(value) = entry.get(name) {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                vars.insert(name.clone(), rendered);
            }
        }
    }
    vars
}

/// Drives the iteration loop over a [`StepRegistry`] (spec §4.5).
pub struct FlowOrchestrator<D, P, V = DefaultCompletionValidator, C = SystemClock, L = TracingLogger>
where
    D: Dispatcher,
    P: PromptResolver,
    V: CompletionValidator,
    C: Clock,
    L: Logger,
{
    registry: Arc<StepRegistry>,
    dispatcher: Arc<D>,
    prompt_resolver: Arc<P>,
    completion_chain: CompletionChain<V>,
    classifier: DefaultErrorClassifier,
    clock: C,
    logger: L,
    gate: GateInterpreter,
    router: WorkflowRouter,
    event_bus: EventBus,
    boundary_hook: Option<Box<dyn Fn(&BoundaryHookPayload) + Send + Sync>>,
    config: AgentConfig,
    state: OrchestratorState,
}

impl<D, P, C, L> FlowOrchestrator<D, P, DefaultCompletionValidator, C, L>
where
    D: Dispatcher,
    P: PromptResolver,
    C: Clock,
    L: Logger,
{
    /// Build an orchestrator wired with the default completion validator
    /// (spec §4.3: "wired in whenever no CompletionValidator... is
    /// supplied").
    pub fn new(
        registry: Arc<StepRegistry>,
        dispatcher: D,
        prompt_resolver: P,
        clock: C,
        logger: L,
        config: AgentConfig,
    ) -> Self {
        Self::with_validator(
            registry,
            dispatcher,
            prompt_resolver,
            DefaultCompletionValidator,
            clock,
            logger,
            config,
        )
    }
}

impl<D, P, V, C, L> FlowOrchestrator<D, P, V, C, L>
where
    D: Dispatcher,
    P: PromptResolver,
    V: CompletionValidator,
    C: Clock,
    L: Logger,
{
    pub fn with_validator(
        registry: Arc<StepRegistry>,
        dispatcher: D,
        prompt_resolver: P,
        validator: V,
        clock: C,
        logger: L,
        config: AgentConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher: Arc::new(dispatcher),
            prompt_resolver: Arc::new(prompt_resolver),
            completion_chain: CompletionChain::with_validator(validator),
            classifier: DefaultErrorClassifier::new(),
            clock,
            logger,
            gate: GateInterpreter::new(),
            router: WorkflowRouter::new(),
            event_bus: EventBus::new(),
            boundary_hook: None,
            config,
            state: OrchestratorState::Idle,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Register an event subscriber. Must be called before [`Self::run`]
    /// (spec §4.6: "Subscribers registered before run()").
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.event_bus.subscribe(handler);
    }

    /// Register the single boundary-hook handler invoked when a closure
    /// step's gate allows `closing` or `repeat` (spec §4.5 step 7).
    pub fn set_boundary_hook<F>(&mut self, handler: F)
    where
        F: Fn(&BoundaryHookPayload) + Send + Sync + 'static,
    {
        self.boundary_hook = Some(Box::new(handler));
    }

    /// Run to completion or fatal error, with no cancellation source.
    pub async fn run(&mut self) -> Result<RunResult, RuntimeError> {
        self.run_cancellable(CancellationToken::new()).await
    }

    /// Run to completion, fatal error, or cancellation.
    ///
    /// Cancellation is observed at the same suspension points as prompt
    /// resolution and model dispatch (spec §5, "Cancellation").
    pub async fn run_cancellable(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<RunResult, RuntimeError> {
        if self.state != OrchestratorState::Idle {
            return Err(RuntimeError::AlreadyRan);
        }
        self.state = OrchestratorState::Running;

        let started_at = self.clock.now_ms();
        let mut current_step_id: Option<StepId> = None;
        let mut iteration: u32 = 1;
        let mut retry_prompt: Option<String> = None;
        let mut step_context = StepContext::new();
        let mut visited_order: Vec<StepId> = Vec::new();

        let result = loop {
            if iteration > self.config.max_iterations {
                break Err(RuntimeError::AgentMaxIterations {
                    max_iterations: self.config.max_iterations,
                });
            }

            // --- step 1: select step ---
            let step_id = if iteration == 1 {
                match self.registry.entry_step_for(&self.config.completion_type) {
                    Some(id) => id.clone(),
                    None => {
                        break Err(RuntimeError::NoEntryStep {
                            completion_type: self.config.completion_type.clone(),
                        })
                    }
                }
            } else {
                match &current_step_id {
                    Some(id) => id.clone(),
                    None => break Err(RuntimeError::NoCurrentStep { iteration }),
                }
            };

            let Some(step_def) = self.registry.get(&step_id).cloned() else {
                break Err(RuntimeError::UnknownStep {
                    step_id: step_id.to_string(),
                    iteration,
                });
            };

            self.event_bus.emit(EventPayload::IterationStart {
                iteration,
                step_id: step_id.clone(),
            });

            // --- step 2: resolve prompt ---
            self.state = OrchestratorState::AwaitingDispatch;
            let overrides = if step_def.kind() == StepKind::Closure
                && !self.config.closure_action.is_default()
            {
                let mut map = HashMap::new();
                map.insert(
                    "closure_action".to_string(),
                    self.config.closure_action.as_str().to_string(),
                );
                Some(map)
            } else {
                None
            };
            let vars = collect_vars(&step_context, &visited_order, &step_def.uv_variables);

            let resolve_fut = self
                .prompt_resolver
                .resolve(&step_id, &vars, overrides.as_ref());
            let resolution = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    break Err(RuntimeError::AgentCancelled { reason: "cancelled during prompt resolution".to_string() });
                }
                res = resolve_fut => res,
            };
            let mut prompt = match resolution {
                Ok(resolution) => resolution.content,
                Err(err) => {
                    self.logger.warn(
                        "prompt resolution failed; using built-in fallback",
                        &[("step", step_id.to_string()), ("error", err.to_string())],
                    );
                    builtin_fallback_prompt(&step_id)
                }
            };
            if let Some(pending) = retry_prompt.take() {
                prompt.push_str("\n\n");
                prompt.push_str(&pending);
            }

            // --- step 3: dispatch turn ---
            let dispatcher = Arc::clone(&self.dispatcher);
            let classifier = &self.classifier;
            let policy = self.config.retry_policy.clone();
            let logger = &self.logger;
            let step_id_for_dispatch = step_id.clone();
            let dispatch_iteration = iteration;
            let dispatch_fut = execute_with_retry(
                || {
                    let dispatcher = Arc::clone(&dispatcher);
                    let prompt = prompt.clone();
                    let step_id = step_id_for_dispatch.clone();
                    async move {
                        let ctx = DispatchContext {
                            step_id: &step_id,
                            iteration: dispatch_iteration,
                        };
                        dispatcher.run(&prompt, &ctx).await
                    }
                },
                classifier,
                &policy,
                Some(|attempt: u32, delay: u64, classified: &turnflow_core::ClassifiedError| {
                    logger.warn(
                        "retrying dispatch",
                        &[
                            ("attempt", attempt.to_string()),
                            ("delay_ms", delay.to_string()),
                            ("category", classified.category.to_string()),
                        ],
                    );
                }),
            );
            let summary = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    break Err(RuntimeError::AgentCancelled { reason: "cancelled during dispatch".to_string() });
                }
                res = dispatch_fut => res,
            };
            let mut summary = match summary {
                Ok(summary) => summary,
                Err(err) => {
                    self.event_bus.emit(EventPayload::Error {
                        message: err.to_string(),
                        category: None,
                        iteration,
                    });
                    break Err(RuntimeError::Dispatch(err));
                }
            };
            self.state = OrchestratorState::Transitioning;

            // --- step 4: normalize output ---
            if let Some(serde_json::Value::Object(obj)) = &mut summary.structured_output {
                if let Some(serde_json::Value::String(reported)) = obj.get("stepId") {
                    if reported != step_id.as_str() {
                        self.logger.warn(
                            "structuredOutput.stepId disagreed with expected step; overwriting",
                            &[
                                ("expected", step_id.to_string()),
                                ("reported", reported.clone()),
                            ],
                        );
                        obj.insert(
                            "stepId".to_string(),
                            serde_json::Value::String(step_id.to_string()),
                        );
                    }
                }
            }

            // --- step 5: record output ---
            step_context.record(step_id.clone(), &summary);
            if !visited_order.contains(&step_id) {
                visited_order.push(step_id.clone());
            }

            // --- step 6: emit iterationEnd ---
            self.event_bus
                .emit(EventPayload::IterationEnd { summary: summary.clone() });

            // --- step 7: boundary hook ---
            let allows_closing_or_repeat = step_def
                .structured_gate
                .as_ref()
                .map(|g| {
                    g.allowed_intents.contains(&turnflow_core::Intent::Closing)
                        || g.allowed_intents.contains(&turnflow_core::Intent::Repeat)
                })
                .unwrap_or(false);
            if step_def.kind() == StepKind::Closure && allows_closing_or_repeat {
                let payload = BoundaryHookPayload {
                    step_id: step_id.clone(),
                    step_kind: step_def.kind(),
                    structured_output: summary.structured_output.clone(),
                };
                self.event_bus
                    .emit(EventPayload::BoundaryHook(payload.clone()));
                if let Some(hook) = &self.boundary_hook {
                    hook(&payload);
                }
            }

            // --- step 8: completion check ---
            if self
                .completion_chain
                .has_ai_completion_declaration(&summary)
            {
                let outcome = self
                    .completion_chain
                    .validate(&self.registry, &step_id, &summary)
                    .await;
                if outcome.valid {
                    self.event_bus.emit(EventPayload::Completion {
                        reason: "AI-declared completion validated".to_string(),
                        step_id: Some(step_id.clone()),
                        iteration,
                    });
                    break Ok(RunResult {
                        completed: true,
                        iterations: iteration,
                        final_step_id: Some(step_id),
                        reason: "completed".to_string(),
                        last_summary: Some(summary),
                    });
                } else {
                    retry_prompt = outcome.retry_prompt;
                    current_step_id = Some(step_id);
                    iteration += 1;
                    continue;
                }
            }

            // --- step 9: transition ---
            let schema_resolution_failed =
                step_def.structured_gate.is_some() && summary.structured_output.is_none();
            if schema_resolution_failed {
                self.logger.warn(
                    "no structured output for a step with a structuredGate; retrying",
                    &[("step", step_id.to_string())],
                );
                current_step_id = Some(step_id);
                iteration += 1;
                continue;
            }

            let output = summary
                .structured_output
                .clone()
                .unwrap_or(serde_json::Value::Null);
            let interpretation = match self.gate.interpret(&output, &step_def) {
                Ok(interpretation) => interpretation,
                Err(err) => {
                    self.event_bus.emit(EventPayload::Error {
                        message: err.to_string(),
                        category: None,
                        iteration,
                    });
                    break Err(RuntimeError::Gate(err));
                }
            };
            if let Some(handoff) = &interpretation.handoff {
                step_context.merge_handoff(step_id.clone(), handoff);
            }

            let outcome = match self.router.route(&self.registry, &step_id, &interpretation) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.event_bus.emit(EventPayload::Error {
                        message: err.to_string(),
                        category: None,
                        iteration,
                    });
                    break Err(RuntimeError::Routing(err));
                }
            };
            if let Some(warning) = &outcome.warning {
                self.logger
                    .warn(warning, &[("step", step_id.to_string())]);
            }

            if outcome.signal_completion {
                self.event_bus.emit(EventPayload::Completion {
                    reason: outcome.reason.clone(),
                    step_id: Some(outcome.next_step_id.clone()),
                    iteration,
                });
                break Ok(RunResult {
                    completed: true,
                    iterations: iteration,
                    final_step_id: Some(outcome.next_step_id),
                    reason: outcome.reason,
                    last_summary: Some(summary),
                });
            }

            current_step_id = Some(outcome.next_step_id);
            iteration += 1;
        };

        self.state = OrchestratorState::Terminating;
        self.logger.debug(
            "run finished",
            &[(
                "elapsed",
                turnflow_core::format_elapsed_ms(self.clock.now_ms().saturating_sub(started_at)),
            )],
        );
        result
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
