// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use turnflow_core::{RegistryDocument, StepDefinition};

fn summary_with(output: Value) -> IterationSummary {
    IterationSummary {
        iteration: 1,
        structured_output: Some(output),
        ..Default::default()
    }
}

fn step(id: &str) -> StepDefinition {
    StepDefinition {
        step_id: StepId::new(id),
        name: id.to_string(),
        fallback_key: None,
        edition: None,
        uv_variables: vec![],
        structured_gate: None,
        transitions: HashMap::new(),
        completion_conditions: None,
        on_failure: None,
        output_schema: None,
    }
}

fn registry(steps: Vec<StepDefinition>) -> StepRegistry {
    let mut map = HashMap::new();
    for s in steps {
        map.insert(s.step_id.clone(), s);
    }
    StepRegistry::build(RegistryDocument {
        agent_id: "a".to_string(),
        version: "1".to_string(),
        steps: map,
        entry_step: None,
        entry_step_mapping: HashMap::new(),
        completion_steps: HashMap::new(),
    })
    .unwrap()
}

#[test]
fn ai_declaration_requires_closing_or_complete_action() {
    let chain = CompletionChain::new();
    assert!(chain.has_ai_completion_declaration(&summary_with(
        serde_json::json!({"next_action": {"action": "closing"}})
    )));
    assert!(chain.has_ai_completion_declaration(&summary_with(
        serde_json::json!({"next_action": {"action": "Complete"}})
    )));
    assert!(!chain.has_ai_completion_declaration(&summary_with(
        serde_json::json!({"next_action": {"action": "continue"}})
    )));
}

#[test]
fn status_completed_alone_is_not_a_completion_signal() {
    let chain = CompletionChain::new();
    assert!(!chain.has_ai_completion_declaration(&summary_with(
        serde_json::json!({"status": "completed"})
    )));
}

#[test]
fn ai_declaration_requires_next_action_to_be_an_object() {
    let chain = CompletionChain::new();
    assert!(!chain.has_ai_completion_declaration(&summary_with(
        serde_json::json!({"next_action": "closing"})
    )));
}

#[test]
fn completion_step_id_falls_back_to_convention_without_registry() {
    let chain = CompletionChain::new();
    assert_eq!(chain.completion_step_id(None, "issue"), "closure.issue");
}

#[test]
fn completion_step_id_uses_registry_mapping() {
    let chain = CompletionChain::new();
    let mut map = HashMap::new();
    map.insert(
        StepId::new("closure.issue").to_string(),
        StepId::new("closure.issue"),
    );
    let mut doc = RegistryDocument {
        agent_id: "a".to_string(),
        version: "1".to_string(),
        steps: HashMap::new(),
        entry_step: None,
        entry_step_mapping: HashMap::new(),
        completion_steps: HashMap::new(),
    };
    doc.steps.insert(StepId::new("closure.issue"), step("closure.issue"));
    doc.completion_steps
        .insert("closure.issue".to_string(), StepId::new("closure.issue"));
    let reg = StepRegistry::build(doc).unwrap();
    assert_eq!(chain.completion_step_id(Some(&reg), "issue"), "closure.issue");
}

#[tokio::test]
async fn validate_passes_unknown_step_as_no_op() {
    let chain = CompletionChain::new();
    let reg = registry(vec![]);
    let outcome = chain
        .validate(&reg, &StepId::new("closure.issue"), &summary_with(serde_json::json!({})))
        .await;
    assert!(outcome.valid);
}

#[tokio::test]
async fn default_validator_requires_git_clean_and_type_check() {
    let chain = CompletionChain::new();
    let reg = registry(vec![step("closure.issue")]);
    let summary = summary_with(serde_json::json!({
        "validation": {"git_clean": false, "type_check_passed": true}
    }));
    let outcome = chain.validate(&reg, &StepId::new("closure.issue"), &summary).await;
    assert!(!outcome.valid);
    assert!(outcome.retry_prompt.unwrap().contains("git_clean is false"));
}

#[tokio::test]
async fn default_validator_passes_when_required_checks_are_true() {
    let chain = CompletionChain::new();
    let reg = registry(vec![step("closure.issue")]);
    let summary = summary_with(serde_json::json!({
        "validation": {"git_clean": true, "type_check_passed": true}
    }));
    let outcome = chain.validate(&reg, &StepId::new("closure.issue"), &summary).await;
    assert!(outcome.valid);
}

#[tokio::test]
async fn optional_checks_only_fail_when_explicitly_false() {
    let chain = CompletionChain::new();
    let reg = registry(vec![step("closure.issue")]);
    let summary = summary_with(serde_json::json!({
        "validation": {
            "git_clean": true,
            "type_check_passed": true,
            "tests_passed": false
        }
    }));
    let outcome = chain.validate(&reg, &StepId::new("closure.issue"), &summary).await;
    assert!(!outcome.valid);
    assert!(outcome.retry_prompt.unwrap().contains("tests_passed is false"));
}

#[tokio::test]
async fn missing_optional_checks_do_not_fail() {
    let chain = CompletionChain::new();
    let reg = registry(vec![step("closure.issue")]);
    let summary = summary_with(serde_json::json!({
        "validation": {"git_clean": true, "type_check_passed": true}
    }));
    let outcome = chain.validate(&reg, &StepId::new("closure.issue"), &summary).await;
    assert!(outcome.valid);
}
