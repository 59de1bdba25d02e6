// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step identifiers.
//!
//! `StepId` is a dotted identifier such as `initial.issue`,
//! `continuation.project.preparation`, or `closure.issue`. The first
//! dotted segment is the step's *phase*, a small closed set that implies
//! the step's [`crate::StepKind`].

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Trait for truncating identifiers to a short prefix.
pub trait ShortId {
    /// Returns a string slice truncated to at most `n` characters.
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// Dotted identifier for a step definition in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first dotted segment, e.g. `"initial"` for `initial.issue`.
    ///
    /// A `stepId` with no dot (malformed input) returns the whole string
    /// as its own phase; callers should treat that as `StepKind::Work` via
    /// [`crate::intent::derive_kind`]'s fallback arm.
    pub fn phase(&self) -> &str {
        self.0.split('.').next().unwrap_or(self.0.as_str())
    }

    /// Everything after the first dotted segment, e.g. `"issue"` for
    /// `initial.issue`, or `"project.preparation"` for
    /// `continuation.project.preparation`.
    pub fn rest(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, rest)| rest)
    }

    /// Build a sibling id by swapping this id's phase for `new_phase`,
    /// keeping the rest of the dotted path. Used by the router's default
    /// `initial.` → `continuation.` fallback (spec §4.2 step 8).
    pub fn with_phase(&self, new_phase: &str) -> Option<StepId> {
        self.rest().map(|rest| StepId::new(format!("{new_phase}.{rest}")))
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for StepId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
