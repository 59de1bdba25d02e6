// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn has_errors_reflects_error_vec() {
    let clean = IterationSummary::default();
    assert!(!clean.has_errors());

    let dirty = IterationSummary {
        errors: vec!["boom".to_string()],
        ..Default::default()
    };
    assert!(dirty.has_errors());
}

#[test]
fn record_merges_structured_output_and_metadata() {
    let mut ctx = StepContext::new();
    let summary = IterationSummary {
        iteration: 2,
        structured_output: Some(serde_json::json!({"next_action": {"action": "next"}})),
        session_id: Some("sess-1".to_string()),
        errors: vec!["transient".to_string()],
        ..Default::default()
    };
    ctx.record(StepId::new("initial.issue"), &summary);

    let entry = ctx.get(&StepId::new("initial.issue")).unwrap();
    assert_eq!(entry["iteration"], serde_json::json!(2));
    assert_eq!(entry["sessionId"], serde_json::json!("sess-1"));
    assert_eq!(entry["hasErrors"], serde_json::json!(true));
    assert_eq!(entry["errorCount"], serde_json::json!(1));
    assert_eq!(entry["next_action"]["action"], serde_json::json!("next"));
}

#[test]
fn record_is_last_write_wins_per_step() {
    let mut ctx = StepContext::new();
    let first = IterationSummary {
        iteration: 1,
        structured_output: Some(serde_json::json!({"note": "first"})),
        ..Default::default()
    };
    let second = IterationSummary {
        iteration: 2,
        structured_output: Some(serde_json::json!({"note": "second"})),
        ..Default::default()
    };
    ctx.record(StepId::new("continuation.issue"), &first);
    ctx.record(StepId::new("continuation.issue"), &second);

    let entry = ctx.get(&StepId::new("continuation.issue")).unwrap();
    assert_eq!(entry["note"], serde_json::json!("second"));
    assert_eq!(entry["iteration"], serde_json::json!(2));
}

#[test]
fn merge_handoff_adds_keys_without_clobbering_existing_entry() {
    let mut ctx = StepContext::new();
    let summary = IterationSummary {
        iteration: 1,
        structured_output: Some(serde_json::json!({"reason": "ok"})),
        ..Default::default()
    };
    ctx.record(StepId::new("initial.issue"), &summary);

    let mut handoff = serde_json::Map::new();
    handoff.insert("understanding".to_string(), serde_json::json!("clear"));
    ctx.merge_handoff(StepId::new("initial.issue"), &handoff);

    let entry = ctx.get(&StepId::new("initial.issue")).unwrap();
    assert_eq!(entry["reason"], serde_json::json!("ok"));
    assert_eq!(entry["understanding"], serde_json::json!("clear"));
}

#[test]
fn field_looks_up_a_single_key() {
    let mut ctx = StepContext::new();
    let summary = IterationSummary {
        iteration: 1,
        structured_output: Some(serde_json::json!({"testsPass": false})),
        ..Default::default()
    };
    ctx.record(StepId::new("initial.issue"), &summary);

    assert_eq!(
        ctx.field(&StepId::new("initial.issue"), "testsPass"),
        Some(&serde_json::json!(false))
    );
    assert_eq!(ctx.field(&StepId::new("initial.issue"), "missing"), None);
    assert_eq!(ctx.field(&StepId::new("nope"), "testsPass"), None);
}
