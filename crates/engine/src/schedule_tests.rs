// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use pcron_core::{IntervalSpec, TimeSpec};

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, d).unwrap().and_hms_opt(h, m, 0).unwrap()
}

fn job(time: Option<&str>, interval: Option<&str>, post: &[&str]) -> JobDef {
    JobDef {
        name: "j".to_string(),
        command: "true".to_string(),
        active: true,
        time: time.map(|t| TimeSpec::parse(t).unwrap()),
        interval: interval.map(|i| IntervalSpec::parse(i).unwrap()),
        post: post.iter().map(|s| s.to_string()).collect(),
        condition: None,
        queue: "j".to_string(),
        conflict: pcron_catalog::Conflict::Ignore,
        warn: true,
        mail: pcron_catalog::MailPolicy::Error,
        mailto: "alice".to_string(),
        username: "alice".to_string(),
        hostname: "example.org".to_string(),
        sendmail: pcron_catalog::DEFAULT_SENDMAIL.to_string(),
    }
}

#[test]
fn interval_fires_at_activation_when_never_scheduled() {
    let def = job(None, Some("20"), &[]);
    let rec = JobRecord::default();
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Interval, at(5, 0, 0))));
}

#[test]
fn interval_advances_from_anchor() {
    let def = job(None, Some("20"), &[]);
    let rec = JobRecord { anchor: Some(at(5, 0, 0)), ..Default::default() };
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Interval, at(5, 0, 20))));
}

#[test]
fn post_job_interval_is_a_fallback_not_an_immediate_fire() {
    let def = job(None, Some("1d"), &["other"]);
    let rec = JobRecord::default();
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Interval, at(6, 0, 0))));
}

#[test]
fn pure_post_job_has_no_timed_fire() {
    let def = job(None, None, &["other"]);
    assert_eq!(next_fire(&def, &JobRecord::default(), at(5, 0, 0)), None);
}

#[test]
fn calendar_searches_after_last_consideration() {
    let def = job(Some("0 */8 * * *"), None, &[]);
    let rec = JobRecord::default();
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Time, at(5, 0, 0))));

    let rec = JobRecord { last_scheduled: Some(at(5, 0, 0)), ..Default::default() };
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Time, at(5, 8, 0))));
}

#[test]
fn calendar_wins_ties_with_interval() {
    let def = job(Some("0 0 * * *"), Some("1d"), &[]);
    let rec = JobRecord {
        last_scheduled: Some(at(5, 0, 0)),
        anchor: Some(at(5, 0, 0)),
        ..Default::default()
    };
    assert_eq!(next_fire(&def, &rec, at(5, 0, 0)), Some((Trigger::Time, at(6, 0, 0))));
}

#[test]
fn unreachable_calendar_yields_nothing() {
    let def = job(Some("0 0 30 2 *"), None, &[]);
    assert_eq!(next_fire(&def, &JobRecord::default(), at(5, 0, 0)), None);
}

#[test]
fn post_gate_rate_limits_by_interval() {
    let def = job(None, Some("1d"), &["other"]);

    // Never fired: always open.
    assert!(post_gate_open(&def, &JobRecord::default(), at(5, 0, 5)));

    // Fired recently: closed until the interval elapses.
    let rec = JobRecord { last_scheduled: Some(at(5, 0, 5)), ..Default::default() };
    assert!(!post_gate_open(&def, &rec, at(5, 8, 5)));
    assert!(post_gate_open(&def, &rec, at(6, 0, 5)));

    // No interval: never gated.
    let def = job(None, None, &["other"]);
    let rec = JobRecord { last_scheduled: Some(at(5, 0, 5)), ..Default::default() };
    assert!(post_gate_open(&def, &rec, at(5, 0, 6)));
}
