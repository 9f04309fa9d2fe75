// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 5).unwrap().and_hms_opt(h, m, s).unwrap()
}

#[test]
fn minute_floor_strips_seconds() {
    assert_eq!(minute_floor(at(10, 30, 59)), at(10, 30, 0));
    assert_eq!(minute_floor(at(10, 30, 0)), at(10, 30, 0));
}

#[test]
fn next_minute_is_strictly_after() {
    assert_eq!(next_minute(at(10, 30, 0)), at(10, 31, 0));
    assert_eq!(next_minute(at(10, 30, 59)), at(10, 31, 0));
    let midnight = NaiveDate::from_ymd_opt(1970, 1, 6).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(next_minute(at(23, 59, 30)), midnight);
}

#[test]
fn virtual_clock_advances() {
    let clock = VirtualClock::new(at(0, 0, 0));
    clock.advance(Duration::minutes(5));
    assert_eq!(clock.now(), at(0, 5, 0));

    // set() never moves backwards
    clock.set(at(0, 1, 0));
    assert_eq!(clock.now(), at(0, 5, 0));
    clock.set(at(0, 10, 0));
    assert_eq!(clock.now(), at(0, 10, 0));
}
