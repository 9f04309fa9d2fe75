// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const MIN_PER_WEEK: i64 = 7 * 24 * 60;
const MIN_PER_DAY: i64 = 24 * 60;

#[test]
fn valid_intervals() {
    let cases: &[(&str, i64)] = &[
        ("1m", 4 * MIN_PER_WEEK),
        ("3m", 12 * MIN_PER_WEEK),
        ("1w", MIN_PER_WEEK),
        ("23w", 23 * MIN_PER_WEEK),
        ("123w", 123 * MIN_PER_WEEK),
        ("1d", MIN_PER_DAY),
        ("7d", MIN_PER_WEEK),
        ("1h", 60),
        ("144h", 144 * 60),
        ("23", 23),
        ("1", 1),
        ("1m1w1d1h1", 5 * MIN_PER_WEEK + MIN_PER_DAY + 60 + 1),
        ("2m1d1h", 8 * MIN_PER_WEEK + MIN_PER_DAY + 60),
        ("21d23", 3 * MIN_PER_WEEK + 23),
        ("1H30", 90),
    ];
    for (value, expect) in cases {
        let spec = IntervalSpec::parse(value).unwrap_or_else(|e| panic!("parsing {value:?}: {e}"));
        assert_eq!(spec.minutes(), *expect, "parsing {value:?}");
    }
}

#[test]
fn invalid_intervals() {
    for value in ["", "0", "0h", "x", "1x", "h1", "1h2d", "1d1d", "23 "] {
        assert!(IntervalSpec::parse(value).is_err(), "{value:?} should not parse");
    }
}

#[test]
fn equality_ignores_spelling() {
    assert_eq!(IntervalSpec::parse("7d").unwrap(), IntervalSpec::parse("1w").unwrap());
    assert_eq!(IntervalSpec::parse("90").unwrap(), IntervalSpec::parse("1h30").unwrap());
    assert_ne!(IntervalSpec::parse("1h").unwrap(), IntervalSpec::parse("1d").unwrap());
}
