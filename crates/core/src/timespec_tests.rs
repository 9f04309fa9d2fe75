// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
}

fn parse_minute(value: &str) -> Result<Vec<u32>, TimeSpecError> {
    parse_field("minute", 0, 60, value, &[])
}

#[test]
fn field_valid_values() {
    let cases: &[(&str, &[u32])] = &[
        ("0", &[0]),
        ("59", &[59]),
        ("1,2,3,4", &[1, 2, 3, 4]),
        ("1-1", &[1]),
        ("1-6", &[1, 2, 3, 4, 5, 6]),
        ("1-7,2-4", &[1, 2, 3, 4, 5, 6, 7]),
        ("1-3,6-7", &[1, 2, 3, 6, 7]),
        ("1-7/3", &[1, 4, 7]),
        ("1-2~2", &[1]),
        ("1-2~2,2-3~2~3", &[1]),
        ("1-4~2~3", &[1, 4]),
    ];
    for (value, expect) in cases {
        let result = parse_minute(value).unwrap_or_else(|e| panic!("parsing {value:?}: {e}"));
        assert_eq!(&result, expect, "parsing {value:?}");
    }

    let all: Vec<u32> = (0..60).collect();
    assert_eq!(parse_minute("*").unwrap(), all);
    let stepped: Vec<u32> = (0..60).step_by(2).collect();
    assert_eq!(parse_minute("*/2").unwrap(), stepped);
}

#[test]
fn field_invalid_values() {
    for value in ["60", "-1", "0-60", "5-", "1,2,100,3,4", "2-1", "*/60", "*/-2", "1~1", "1-2~3"] {
        assert!(parse_minute(value).is_err(), "{value:?} should not parse");
    }
}

#[test]
fn field_names() {
    let months = parse_field("month", 1, 13, "jan-aug", &MONTH_NAMES).unwrap();
    assert_eq!(months, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(parse_field("month", 1, 13, "jon", &MONTH_NAMES).is_err());
    assert!(parse_field("month", 1, 13, "january", &MONTH_NAMES).is_err());
    assert!(parse_field("month", 1, 13, "jan-", &MONTH_NAMES).is_err());

    let days = parse_field("day of week", 0, 8, "sun-thu", &DAY_NAMES).unwrap();
    assert_eq!(days, vec![0, 1, 2, 3, 4]);
    assert!(parse_field("day of week", 0, 8, "mun", &DAY_NAMES).is_err());
}

#[test]
fn sunday_is_zero_or_seven() {
    let spec = TimeSpec::parse("0 0 * * 7").unwrap();
    // 1970-01-04 was a Sunday.
    assert!(spec.matches(at(1970, 1, 4, 0, 0)));
    let spec = TimeSpec::parse("0 0 * * 0").unwrap();
    assert!(spec.matches(at(1970, 1, 4, 0, 0)));
}

#[test]
fn day_fields_add_up_when_both_restricted() {
    // 2010-03-07 was a Sunday, 2010-03-08 a Monday.
    let cases = [
        ("* */2 * * *", at(2010, 3, 7, 16, 0), true),
        ("* */2 * * *", at(2010, 3, 7, 15, 0), false),
        ("0 * */2 * sun", at(2010, 3, 7, 0, 0), true),
        ("0 * */7 * sun", at(2010, 3, 7, 0, 0), true),
        ("0 * */7 * *", at(2010, 3, 7, 0, 0), false),
        ("0 * */7 * mon", at(2010, 3, 8, 0, 0), true),
        ("0 * */2 * mon", at(2010, 3, 8, 0, 0), true),
        ("0 * */2 * *", at(2010, 3, 8, 0, 0), false),
        ("0 * * mar *", at(2010, 3, 7, 15, 0), true),
        ("0 * * jan-aug *", at(2010, 3, 7, 15, 0), true),
        ("0 * * aug *", at(2010, 3, 7, 15, 0), false),
        ("0 * * * sun", at(2010, 3, 7, 15, 0), true),
        ("0 * * * sun-thu", at(2010, 3, 8, 15, 0), true),
    ];
    for (value, t, expect) in cases {
        let spec = TimeSpec::parse(value).unwrap();
        assert_eq!(spec.matches(t), expect, "{value:?} at {t}");
    }
}

#[test]
fn shortcuts_expand() {
    let expansions = [
        ("@hourly", "0 * * * *"),
        ("@daily", "0 0 * * *"),
        ("@midnight", "0 0 * * *"),
        ("@weekly", "0 0 * * 0"),
        ("@monthly", "0 0 1 * *"),
        ("@yearly", "0 0 1 1 *"),
        ("@annually", "0 0 1 1 *"),
    ];
    for (shortcut, expanded) in expansions {
        assert_eq!(
            TimeSpec::parse(shortcut).unwrap(),
            TimeSpec::parse(expanded).unwrap(),
            "{shortcut} should expand to {expanded}"
        );
    }
}

#[test]
fn next_match_walks_fields() {
    let spec = TimeSpec::parse("30 4 * * *").unwrap();
    assert_eq!(spec.next_match(at(1970, 1, 5, 0, 0)), Some(at(1970, 1, 5, 4, 30)));
    assert_eq!(spec.next_match(at(1970, 1, 5, 4, 30)), Some(at(1970, 1, 5, 4, 30)));
    assert_eq!(spec.next_match(at(1970, 1, 5, 4, 31)), Some(at(1970, 1, 6, 4, 30)));

    // Jumps over inadmissible months.
    let spec = TimeSpec::parse("0 0 1 mar *").unwrap();
    assert_eq!(spec.next_match(at(1970, 1, 5, 0, 0)), Some(at(1970, 3, 1, 0, 0)));

    // Weekday-only expression.
    let spec = TimeSpec::parse("15 8 * * mon").unwrap();
    assert_eq!(spec.next_match(at(1970, 1, 6, 0, 0)), Some(at(1970, 1, 12, 8, 15)));
}

#[test]
fn next_match_gives_up_beyond_horizon() {
    // February 30th never exists.
    let spec = TimeSpec::parse("0 0 30 2 *").unwrap();
    assert_eq!(spec.next_match(at(1970, 1, 5, 0, 0)), None);
}

#[test]
fn leap_day_matches_in_leap_years_only() {
    let spec = TimeSpec::parse("0 0 29 2 *").unwrap();
    assert_eq!(spec.next_match(at(1970, 1, 1, 0, 0)), Some(at(1972, 2, 29, 0, 0)));
}
