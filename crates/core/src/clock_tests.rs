// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn system_clock_returns_recent_time() {
    let before = Utc::now();
    let now = SystemClock.now();
    assert!(now >= before);
}

#[test]
fn fake_clock_returns_fixed_time() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
    assert_eq!(clock.now(), start);
}

#[test]
fn fake_clock_advances() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    clock.advance(chrono::Duration::seconds(30));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(30));
}

#[test]
fn fake_clock_set_overrides() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    clock.set(later);
    assert_eq!(clock.now(), later);
}

#[test]
fn fake_clock_clone_shares_state() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    let handle = clock.clone();
    handle.advance(chrono::Duration::seconds(5));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
}
