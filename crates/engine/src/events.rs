// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus (C6): synchronous publish/subscribe fabric firing at
//! well-defined lifecycle points (spec §4.6).
//!
//! Single-threaded, queue-free dispatch: subscribers registered before
//! `run()` are invoked in registration order every time an event fires.
//! A handler that panics is caught and logged; it never interrupts
//! delivery to the handlers registered after it (spec §4.6, §9 "Event
//! bus" design note).

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use turnflow_core::{IterationSummary, StepId, StepKind};

/// Payload for the `boundaryHook` event (spec §6, Event payloads):
/// synthesized only for closure steps whose gate allows `closing` or
/// `repeat` (spec §4.5 step 7).
#[derive(Debug, Clone)]
pub struct BoundaryHookPayload {
    pub step_id: StepId,
    pub step_kind: StepKind,
    pub structured_output: Option<Value>,
}

/// Every lifecycle moment the Orchestrator fires through the bus.
#[derive(Debug, Clone)]
pub enum EventPayload {
    IterationStart { iteration: u32, step_id: StepId },
    IterationEnd { summary: IterationSummary },
    BoundaryHook(BoundaryHookPayload),
    Completion {
        reason: String,
        step_id: Option<StepId>,
        iteration: u32,
    },
    Error {
        message: String,
        category: Option<String>,
        iteration: u32,
    },
}

impl EventPayload {
    /// Short human-readable summary, grounded on the teacher's
    /// `Event::log_summary` convention for structured-log one-liners.
    pub fn log_summary(&self) -> String {
        match self {
            EventPayload::IterationStart { iteration, step_id } => {
                format!("iterationStart #{iteration} at {step_id}")
            }
            EventPayload::IterationEnd { summary } => {
                format!(
                    "iterationEnd #{} ({} error(s))",
                    summary.iteration,
                    summary.errors.len()
                )
            }
            EventPayload::BoundaryHook(payload) => {
                format!("boundaryHook at {} ({})", payload.step_id, payload.step_kind)
            }
            EventPayload::Completion {
                reason, iteration, ..
            } => format!("completion at iteration {iteration}: {reason}"),
            EventPayload::Error {
                message, iteration, ..
            } => format!("error at iteration {iteration}: {message}"),
        }
    }
}

type Handler = Box<dyn Fn(&EventPayload) + Send + Sync>;

/// Synchronous pub/sub bus. Subscribe before calling `run()`; emission
/// order mirrors the order events occur in the iteration loop (spec §5,
/// "Ordering").
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Handler>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, invoked on every subsequent `emit` call in the
    /// order handlers were registered.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Fire `event` to every registered handler in order. A handler that
    /// panics is caught so it cannot interrupt delivery to its peers.
    pub fn emit(&self, event: EventPayload) {
        for handler in &self.handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::warn!(
                    event = %event.log_summary(),
                    "event subscriber panicked; continuing to next subscriber"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
