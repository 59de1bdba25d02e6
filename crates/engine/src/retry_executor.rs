// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Retry Executor (C5): classifies failures and re-invokes the
//! operation under an exponential-backoff policy (spec §4.4).

use std::future::Future;
use std::time::Duration;
use turnflow_core::{ClassifiedError, ErrorCategory, RetryPolicy};

/// Classifies an operation's raw failure into a [`ClassifiedError`].
pub trait ErrorClassifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> ClassifiedError;
}

/// Matches the failure's message against an ordered set of substring
/// patterns, yielding `(category, recoverable, guidance)`. Environment
/// failures (sandbox/permissions) are non-recoverable; rate-limit and
/// network failures are recoverable (spec §4.4, "Error classifier").
pub struct DefaultErrorClassifier {
    rules: Vec<(&'static str, ErrorCategory, bool, &'static str)>,
}

impl DefaultErrorClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ("rate limit", ErrorCategory::Api, true, "rate limited; retry with backoff"),
                ("timeout", ErrorCategory::Network, true, "request timed out; retry"),
                ("connection", ErrorCategory::Network, true, "connection failure; retry"),
                ("econnreset", ErrorCategory::Network, true, "connection reset; retry"),
                ("unauthorized", ErrorCategory::Input, false, "check credentials"),
                ("permission denied", ErrorCategory::Environment, false, "check sandbox permissions"),
                ("no such file", ErrorCategory::Environment, false, "check filesystem state"),
                ("invalid", ErrorCategory::Input, false, "check request payload"),
                ("internal server error", ErrorCategory::Internal, true, "transient server fault; retry"),
            ],
        }
    }
}

impl Default for DefaultErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier<String> for DefaultErrorClassifier {
    fn classify(&self, error: &String) -> ClassifiedError {
        let haystack = error.to_ascii_lowercase();
        for (pattern, category, recoverable, guidance) in &self.rules {
            if haystack.contains(pattern) {
                return ClassifiedError {
                    category: *category,
                    recoverable: *recoverable,
                    guidance: guidance.to_string(),
                    matched_pattern: Some((*pattern).to_string()),
                    original: error.clone(),
                };
            }
        }
        ClassifiedError {
            category: ErrorCategory::Unknown,
            recoverable: false,
            guidance: "unrecognized failure".to_string(),
            matched_pattern: None,
            original: error.clone(),
        }
    }
}

impl ErrorClassifier<crate::ports::DispatchError> for DefaultErrorClassifier {
    fn classify(&self, error: &crate::ports::DispatchError) -> ClassifiedError {
        ErrorClassifier::<String>::classify(self, &error.0)
    }
}

/// Run `op` under `policy`, retrying recoverable failures classified by
/// `classifier` with exponential backoff. `on_retry` is invoked with
/// `(attempt, delay_ms, classified)` before each sleep. Attempt numbering
/// starts at 0; the final, non-retried error is returned verbatim.
pub async fn execute_with_retry<T, E, F, Fut, C, R>(
    mut op: F,
    classifier: &C,
    policy: &RetryPolicy,
    mut on_retry: Option<R>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: ErrorClassifier<E>,
    R: FnMut(u32, u64, &ClassifiedError),
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let classified = classifier.classify(&error);
                if !policy.should_retry(attempt, &classified) {
                    return Err(error);
                }
                let delay = policy.delay_for_attempt(attempt);
                if let Some(cb) = on_retry.as_mut() {
                    cb(attempt, delay, &classified);
                }
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_executor_tests.rs"]
mod tests;
