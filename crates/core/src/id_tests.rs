// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn phase_extracts_first_segment() {
    assert_eq!(StepId::new("initial.issue").phase(), "initial");
    assert_eq!(
        StepId::new("continuation.project.preparation").phase(),
        "continuation"
    );
}

#[test]
fn phase_falls_back_to_whole_string_without_a_dot() {
    assert_eq!(StepId::new("closure").phase(), "closure");
}

#[test]
fn rest_returns_remainder_after_first_dot() {
    assert_eq!(StepId::new("initial.issue").rest(), Some("issue"));
    assert_eq!(
        StepId::new("continuation.project.preparation").rest(),
        Some("project.preparation")
    );
    assert_eq!(StepId::new("closure").rest(), None);
}

#[test]
fn with_phase_swaps_the_phase_segment() {
    let initial = StepId::new("initial.issue");
    assert_eq!(
        initial.with_phase("continuation"),
        Some(StepId::new("continuation.issue"))
    );
}

#[test]
fn with_phase_is_none_for_dotless_ids() {
    assert_eq!(StepId::new("closure").with_phase("continuation"), None);
}

#[test]
fn short_truncates_long_strings() {
    assert_eq!("abcdefgh".short(4), "abcd");
    assert_eq!("ab".short(4), "ab");
}

#[test]
fn equality_against_str_and_borrow() {
    let id = StepId::new("initial.issue");
    assert_eq!(id, "initial.issue");
    assert_eq!(id, *"initial.issue");

    use std::collections::HashSet;
    let mut set: HashSet<StepId> = HashSet::new();
    set.insert(id.clone());
    assert!(set.contains("initial.issue"));
}
