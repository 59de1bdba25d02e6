// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy and error classification (spec §4.4).

use serde::{Deserialize, Serialize};

/// Error category a dispatch failure is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Api,
    Input,
    Environment,
    Internal,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Api => "api",
            ErrorCategory::Input => "input",
            ErrorCategory::Environment => "environment",
            ErrorCategory::Internal => "internal",
            ErrorCategory::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A dispatch failure, classified by the error classifier.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub recoverable: bool,
    pub guidance: String,
    pub matched_pattern: Option<String>,
    pub original: String,
}

/// Retry policy: attempt budget plus exponential backoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retryable_categories: Vec<ErrorCategory>,
}

impl RetryPolicy {
    /// `maxRetries=3, initial=1000ms, max=30000ms, mult=2,
    /// retryable={NETWORK, API, INTERNAL}`.
    pub fn default_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            retryable_categories: vec![
                ErrorCategory::Network,
                ErrorCategory::Api,
                ErrorCategory::Internal,
            ],
        }
    }

    /// `maxRetries=0`, empty retryable set.
    pub fn none() -> RetryPolicy {
        RetryPolicy {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            retryable_categories: vec![],
        }
    }

    /// `maxRetries=5, initial=500ms, max=60000ms, mult=2`, same
    /// categories as [`RetryPolicy::default_policy`].
    pub fn aggressive() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay_ms: 500,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            retryable_categories: vec![
                ErrorCategory::Network,
                ErrorCategory::Api,
                ErrorCategory::Internal,
            ],
        }
    }

    pub fn allows_category(&self, category: ErrorCategory) -> bool {
        self.retryable_categories.contains(&category)
    }

    /// `delay = min(initialDelayMs * backoffMultiplier^attempt, maxDelayMs)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let scaled = (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(attempt as i32);
        (scaled.min(self.max_delay_ms as f64)) as u64
    }

    /// Whether a classified error on the given attempt should be retried
    /// (spec §4.4 `shouldRetry`).
    pub fn should_retry(&self, attempt: u32, error: &ClassifiedError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        if !error.recoverable {
            return false;
        }
        self.allows_category(error.category)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::default_policy()
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
