// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn gate_interpretation_error_message_includes_step_and_allowed_intents() {
    let err = GateInterpretationError {
        step_id: "initial.issue".into(),
        allowed_intents: vec![Intent::Next],
    };
    let msg = err.to_string();
    assert!(msg.contains("initial.issue"));
    assert!(msg.contains("Next"));
}

#[test]
fn disallowed_intent_message_names_step_kind_and_intent() {
    let err = RoutingError::DisallowedIntent {
        step_id: "initial.issue".into(),
        step_kind: StepKind::Initial,
        intent: Intent::Closing,
    };
    let msg = err.to_string();
    assert!(msg.contains("initial"));
    assert!(msg.contains("closing"));
}
