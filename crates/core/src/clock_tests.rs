// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_given_value() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
}

#[test]
fn fake_clock_advances_on_demand_only() {
    let clock = FakeClock::new(0);
    assert_eq!(clock.now_ms(), 0);
    clock.advance_ms(500);
    assert_eq!(clock.now_ms(), 500);
    clock.advance_ms(500);
    assert_eq!(clock.now_ms(), 1_000);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new(0);
    let clone = clock.clone();
    clock.advance_ms(250);
    assert_eq!(clone.now_ms(), 250);
}

#[test]
fn system_clock_reports_nonzero_epoch_millis() {
    let clock = SystemClock;
    assert!(clock.now_ms() > 0);
}
