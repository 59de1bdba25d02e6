// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use turnflow_core::ErrorCategory;

#[test]
fn classifier_recognizes_network_and_rate_limit() {
    let classifier = DefaultErrorClassifier::new();
    let err = classifier.classify(&"Connection timeout".to_string());
    assert_eq!(err.category, ErrorCategory::Network);
    assert!(err.recoverable);

    let err = classifier.classify(&"429 rate limit exceeded".to_string());
    assert_eq!(err.category, ErrorCategory::Api);
    assert!(err.recoverable);
}

#[test]
fn classifier_treats_environment_failures_as_non_recoverable() {
    let classifier = DefaultErrorClassifier::new();
    let err = classifier.classify(&"permission denied writing to sandbox".to_string());
    assert_eq!(err.category, ErrorCategory::Environment);
    assert!(!err.recoverable);
}

#[test]
fn classifier_falls_back_to_unknown() {
    let classifier = DefaultErrorClassifier::new();
    let err = classifier.classify(&"something bizarre happened".to_string());
    assert_eq!(err.category, ErrorCategory::Unknown);
    assert!(!err.recoverable);
}

#[tokio::test(start_paused = true)]
async fn non_recoverable_error_invokes_fn_exactly_once() {
    let attempts = AtomicU32::new(0);
    let classifier = DefaultErrorClassifier::new();
    let policy = RetryPolicy::default_policy();

    let result: Result<(), String> = execute_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("permission denied".to_string()) }
        },
        &classifier,
        &policy,
        None::<fn(u32, u64, &ClassifiedError)>,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_recoverable_error_until_success() {
    let attempts = AtomicU32::new(0);
    let classifier = DefaultErrorClassifier::new();
    let policy = RetryPolicy::default_policy();
    let retries: Mutex<Vec<(u32, u64)>> = Mutex::new(Vec::new());

    let result = execute_with_retry(
        || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("connection reset".to_string())
                } else {
                    Ok::<_, String>("ok")
                }
            }
        },
        &classifier,
        &policy,
        Some(|attempt, delay, _: &ClassifiedError| {
            retries.lock().unwrap().push((attempt, delay));
        }),
    )
    .await;

    assert_eq!(result, Ok("ok"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*retries.lock().unwrap(), vec![(0, 1000), (1, 2000)]);
}

#[tokio::test(start_paused = true)]
async fn exhausting_retries_surfaces_original_error() {
    let attempts = AtomicU32::new(0);
    let classifier = DefaultErrorClassifier::new();
    let policy = RetryPolicy::none();

    let result: Result<(), String> = execute_with_retry(
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("timeout".to_string()) }
        },
        &classifier,
        &policy,
        None::<fn(u32, u64, &ClassifiedError)>,
    )
    .await;

    assert_eq!(result, Err("timeout".to_string()));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
