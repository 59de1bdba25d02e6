// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dispatch_error_formats_message() {
    let err = DispatchError::new("timeout");
    assert_eq!(err.to_string(), "dispatch failed: timeout");
}

#[test]
fn prompt_resolve_error_includes_step_id() {
    let err = PromptResolveError {
        step_id: "initial.issue".into(),
        message: "template not found".into(),
    };
    assert!(err.to_string().contains("initial.issue"));
    assert!(err.to_string().contains("template not found"));
}

#[test]
fn tracing_logger_does_not_panic() {
    let logger = TracingLogger;
    logger.debug("hello", &[("a", "1".to_string())]);
    logger.info("hello", &[]);
    logger.warn("hello", &[("b", "2".to_string())]);
    logger.error("hello", &[]);
}
