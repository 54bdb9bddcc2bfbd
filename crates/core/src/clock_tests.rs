// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_advances() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::at(start);

    assert_eq!(clock.now(), start);

    clock.advance(Duration::days(2));
    assert_eq!(clock.now(), start + Duration::days(2));
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::new();
    let target = Utc.with_ymd_and_hms(2026, 6, 15, 12, 30, 0).unwrap();

    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_clones_share_time() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::at(start);
    let other = clock.clone();

    clock.advance(Duration::hours(1));
    assert_eq!(other.now(), start + Duration::hours(1));
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
