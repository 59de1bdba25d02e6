// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;
use turnflow_core::{RegistryDocument, StepDefinition, StepId, StepRegistry};

use super::*;
use crate::test_support::{FakeDispatcher, FakePromptResolver};

fn minimal_registry(step_id: &str) -> Arc<StepRegistry> {
    let mut steps = HashMap::new();
    let mut def = StepDefinition {
        step_id: StepId::new(step_id),
        name: step_id.to_string(),
        fallback_key: None,
        edition: None,
        uv_variables: vec![],
        structured_gate: None,
        transitions: HashMap::new(),
        completion_conditions: None,
        on_failure: None,
        output_schema: None,
    };
    def.transitions
        .insert(turnflow_core::Intent::Next, turnflow_core::TransitionRule::Direct { target: None });
    steps.insert(def.step_id.clone(), def);

    let mut entry_step_mapping = HashMap::new();
    entry_step_mapping.insert("issue".to_string(), StepId::new(step_id));

    Arc::new(
        StepRegistry::build(RegistryDocument {
            agent_id: "test".to_string(),
            version: "1".to_string(),
            steps,
            entry_step: None,
            entry_step_mapping,
            completion_steps: HashMap::new(),
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn a_freshly_built_orchestrator_is_idle() {
    let registry = minimal_registry("initial.issue");
    let orchestrator = FlowOrchestrator::new(
        registry,
        FakeDispatcher::new(),
        FakePromptResolver::new(),
        turnflow_core::SystemClock,
        TracingLogger,
        AgentConfig::new("issue", 5),
    );
    assert_eq!(orchestrator.state(), OrchestratorState::Idle);
}

#[tokio::test]
async fn run_reaches_terminating_and_reports_completion_on_a_terminal_direct_transition() {
    let registry = minimal_registry("initial.issue");
    let mut orchestrator = FlowOrchestrator::new(
        registry,
        FakeDispatcher::new(),
        FakePromptResolver::new(),
        turnflow_core::SystemClock,
        TracingLogger,
        AgentConfig::new("issue", 5),
    );

    let result = orchestrator.run().await.expect("run succeeds");
    assert!(result.completed);
    assert_eq!(result.iterations, 1);
    assert_eq!(orchestrator.state(), OrchestratorState::Terminating);
}

#[tokio::test]
async fn calling_run_twice_on_the_same_orchestrator_is_rejected() {
    let registry = minimal_registry("initial.issue");
    let mut orchestrator = FlowOrchestrator::new(
        registry,
        FakeDispatcher::new(),
        FakePromptResolver::new(),
        turnflow_core::SystemClock,
        TracingLogger,
        AgentConfig::new("issue", 5),
    );

    orchestrator.run().await.expect("first run succeeds");
    let second = orchestrator.run().await;
    assert!(matches!(second, Err(RuntimeError::AlreadyRan)));
}

#[tokio::test]
async fn exceeding_max_iterations_without_reaching_a_terminal_step_errors() {
    let mut steps = HashMap::new();
    let mut def = StepDefinition {
        step_id: StepId::new("continuation.issue"),
        name: "continuation.issue".to_string(),
        fallback_key: None,
        edition: None,
        uv_variables: vec![],
        structured_gate: None,
        transitions: HashMap::new(),
        completion_conditions: None,
        on_failure: None,
        output_schema: None,
    };
    def.transitions.insert(
        turnflow_core::Intent::Next,
        turnflow_core::TransitionRule::Direct {
            target: Some(StepId::new("continuation.issue")),
        },
    );
    steps.insert(def.step_id.clone(), def);
    let mut entry_step_mapping = HashMap::new();
    entry_step_mapping.insert("issue".to_string(), StepId::new("continuation.issue"));
    let registry = Arc::new(
        StepRegistry::build(RegistryDocument {
            agent_id: "test".to_string(),
            version: "1".to_string(),
            steps,
            entry_step: None,
            entry_step_mapping,
            completion_steps: HashMap::new(),
        })
        .unwrap(),
    );

    let mut orchestrator = FlowOrchestrator::new(
        registry,
        FakeDispatcher::new(),
        FakePromptResolver::new(),
        turnflow_core::SystemClock,
        TracingLogger,
        AgentConfig::new("issue", 2),
    );

    let result = orchestrator.run().await;
    assert!(matches!(
        result,
        Err(RuntimeError::AgentMaxIterations { max_iterations: 2 })
    ));
}

#[tokio::test]
async fn cancelling_before_dispatch_ends_the_run_with_agent_cancelled() {
    let registry = minimal_registry("initial.issue");
    let mut orchestrator = FlowOrchestrator::new(
        registry,
        FakeDispatcher::new(),
        FakePromptResolver::new(),
        turnflow_core::SystemClock,
        TracingLogger,
        AgentConfig::new("issue", 5),
    );

    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let result = orchestrator.run_cancellable(cancel).await;
    assert!(matches!(result, Err(RuntimeError::AgentCancelled { .. })));
}
