// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! turnflow-engine: the Step Flow Engine, Completion Chain, Retry &
//! Error Classification, and Boundary Hooks & Event Emission subsystems
//! that act on the `turnflow-core` data model.

pub mod completion;
pub mod error;
pub mod events;
pub mod gate;
pub mod orchestrator;
pub mod ports;
pub mod retry_executor;
pub mod router;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(any(test, feature = "test-support"))]
pub use test_support::{
    DispatchCall, FakeCompletionValidator, FakeDispatcher, FakePromptResolver, RecordingLogger,
};

pub use completion::{
    CompletionChain, CompletionValidator, DefaultCompletionValidator, ValidationOutcome,
    ValidationRequest,
};
pub use error::RuntimeError;
pub use events::{BoundaryHookPayload, EventBus, EventPayload};
pub use gate::{GateInterpreter, Interpretation};
pub use orchestrator::{AgentConfig, ClosureAction, FlowOrchestrator, OrchestratorState, RunResult};
pub use ports::{
    DispatchContext, DispatchError, Dispatcher, Logger, PromptResolution, PromptResolveError,
    PromptResolver, TracingLogger,
};
pub use retry_executor::{execute_with_retry, DefaultErrorClassifier, ErrorClassifier};
pub use router::{RouteOutcome, WorkflowRouter};
