// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field calendar expressions.
//!
//! A [`TimeSpec`] is the classic `minute hour day-of-month month day-of-week`
//! expression. Each field is a set over its domain, written as literals,
//! ranges (`a-b`), steps (`a-b/s`, `*/s`), comma unions, and range
//! exceptions (`a-b~c`) that remove members. Month and day-of-week accept
//! three-letter names; day-of-week 0 and 7 both mean Sunday.
//!
//! When both the day-of-month and day-of-week fields are restricted a day
//! matches if *either* set admits it; otherwise the restricted one (if any)
//! must hold.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a calendar expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeSpecError {
    #[error("malformed timestamp: {0:?}")]
    Malformed(String),

    #[error("invalid {field} value: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} value {value} not in range ({min}-{max})")]
    OutOfRange { field: &'static str, value: u32, min: u32, max: u32 },

    #[error("{field} range {first}-{last} is inverted")]
    InvertedRange { field: &'static str, first: u32, last: u32 },

    #[error("{field} step value {step} not in range (1-{max})")]
    BadStep { field: &'static str, step: u32, max: u32 },

    #[error("{field} exception value {value} outside range {first}-{last}")]
    BadException { field: &'static str, value: u32, first: u32, last: u32 },
}

const MONTH_NAMES: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const DAY_NAMES: [(&str, u32); 7] = [
    ("sun", 0),
    ("mon", 1),
    ("tue", 2),
    ("wed", 3),
    ("thu", 4),
    ("fri", 5),
    ("sat", 6),
];

/// How far the search for the next admissible instant looks before giving
/// up and reporting "no future fire". There is no year field, so an
/// expression like `0 0 30 2 *` never matches.
const SEARCH_HORIZON_DAYS: i64 = 4 * 366;

/// A parsed five-field calendar expression.
///
/// Equality compares the member sets, not the source text, so `@hourly`
/// equals `0 * * * *`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct TimeSpec {
    source: String,
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days_of_month: Vec<u32>,
    months: Vec<u32>,
    days_of_week: Vec<u32>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl TimeSpec {
    /// Parse an expression, expanding the `@`-shortcuts first.
    ///
    /// `@reboot` is not a calendar expression and is rejected here; the
    /// catalog layer maps it to a startup job before calling this.
    pub fn parse(value: &str) -> Result<Self, TimeSpecError> {
        let expanded = match value {
            "@yearly" | "@annually" => "0 0 1 1 *",
            "@monthly" => "0 0 1 * *",
            "@weekly" => "0 0 * * 0",
            "@daily" | "@midnight" => "0 0 * * *",
            "@hourly" => "0 * * * *",
            other => other,
        };

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(TimeSpecError::Malformed(value.to_string()));
        }
        let (minute, hour, dom, month, dow) =
            (fields[0], fields[1], fields[2], fields[3], fields[4]);

        let minutes = parse_field("minute", 0, 60, minute, &[])?;
        let hours = parse_field("hour", 0, 24, hour, &[])?;
        let days_of_month = parse_field("day of month", 1, 32, dom, &[])?;
        let months = parse_field("month", 1, 13, month, &MONTH_NAMES)?;
        // Domain 0-7 because Sunday is written as either 0 or 7.
        let mut days_of_week = parse_field("day of week", 0, 8, dow, &DAY_NAMES)?;
        if days_of_week.contains(&7) {
            days_of_week.retain(|&d| d != 7);
            if !days_of_week.contains(&0) {
                days_of_week.insert(0, 0);
            }
        }

        Ok(Self {
            source: value.to_string(),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_restricted: dom != "*",
            dow_restricted: dow != "*",
        })
    }

    /// The expression as it was written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the given instant (at minute resolution) is admissible.
    pub fn matches(&self, t: NaiveDateTime) -> bool {
        self.minutes.contains(&t.time().minute())
            && self.hours.contains(&t.time().hour())
            && self.months.contains(&t.date().month())
            && self.day_matches(t.date())
    }

    /// The earliest admissible instant `>= from`, or `None` if nothing
    /// matches within the search horizon.
    pub fn next_match(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let from = super::minute_floor(from);
        let horizon = from.date() + Duration::days(SEARCH_HORIZON_DAYS);

        let mut date = from.date();
        while date <= horizon {
            if !self.months.contains(&date.month()) {
                // Jump to the first day of the next month.
                date = first_of_next_month(date)?;
                continue;
            }
            if self.day_matches(date) {
                let floor = if date == from.date() { Some(from.time()) } else { None };
                if let Some(tod) = self.next_time_of_day(floor) {
                    return Some(date.and_time(tod));
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    /// Day admission: when both day fields are restricted they add up
    /// instead of restricting each other.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(&date.day());
        let dow = self.days_of_week.contains(&date.weekday().num_days_from_sunday());
        match (self.dom_restricted, self.dow_restricted) {
            (false, false) => true,
            (true, false) => dom,
            (false, true) => dow,
            (true, true) => dom || dow,
        }
    }

    /// The earliest admissible time of day, at or after `floor` if given.
    fn next_time_of_day(&self, floor: Option<NaiveTime>) -> Option<NaiveTime> {
        let (floor_h, floor_m) = match floor {
            Some(t) => (t.hour(), t.minute()),
            None => (0, 0),
        };
        for &hour in self.hours.iter().filter(|&&h| h >= floor_h) {
            for &minute in &self.minutes {
                if hour > floor_h || minute >= floor_m {
                    return NaiveTime::from_hms_opt(hour, minute, 0);
                }
            }
        }
        None
    }
}

impl PartialEq for TimeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.minutes == other.minutes
            && self.hours == other.hours
            && self.days_of_month == other.days_of_month
            && self.months == other.months
            && self.days_of_week == other.days_of_week
            && self.dom_restricted == other.dom_restricted
            && self.dow_restricted == other.dow_restricted
    }
}

impl std::fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Resolve a literal component, numeric or named.
fn resolve(
    field: &'static str,
    value: &str,
    names: &[(&str, u32)],
) -> Result<u32, TimeSpecError> {
    if let Ok(n) = value.parse::<u32>() {
        return Ok(n);
    }
    names
        .iter()
        .find(|(name, _)| *name == value)
        .map(|&(_, n)| n)
        .ok_or_else(|| TimeSpecError::InvalidValue { field, value: value.to_string() })
}

/// Parse one comma-separated field into a sorted member set.
///
/// `max` is exclusive, matching the classic domains: minutes 0-59,
/// hours 0-23, days 1-31, months 1-12, weekdays 0-7.
fn parse_field(
    field: &'static str,
    min: u32,
    max: u32,
    value: &str,
    names: &[(&str, u32)],
) -> Result<Vec<u32>, TimeSpecError> {
    let mut members = Vec::new();

    for spec in value.split(',') {
        let item = parse_item(field, min, max, spec, names)?;
        for member in item {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }

    members.sort_unstable();
    Ok(members)
}

/// Parse a single field item: `*`, `*/s`, a literal, or `a-b[/s][~c…]`.
fn parse_item(
    field: &'static str,
    min: u32,
    max: u32,
    spec: &str,
    names: &[(&str, u32)],
) -> Result<Vec<u32>, TimeSpecError> {
    let malformed = || TimeSpecError::Malformed(spec.to_string());

    // Split off `~`-exceptions; they only make sense on ranges.
    let mut parts = spec.split('~');
    let head = parts.next().ok_or_else(malformed)?;
    let exceptions: Vec<&str> = parts.collect();

    // Split off an optional `/step`.
    let (head, step) = match head.split_once('/') {
        Some((head, step)) => {
            let step: u32 = step.parse().map_err(|_| malformed())?;
            (head, step)
        }
        None => (head, 1),
    };
    if step < 1 || step >= max {
        return Err(TimeSpecError::BadStep { field, step, max: max - 1 });
    }

    let (first, last, is_range) = if head == "*" {
        (min, max - 1, true)
    } else if let Some((first, last)) = head.split_once('-') {
        if first.is_empty() || last.is_empty() {
            return Err(malformed());
        }
        (resolve(field, first, names)?, resolve(field, last, names)?, true)
    } else {
        let single = resolve(field, head, names)?;
        if step != 1 {
            // A bare literal takes no step.
            return Err(malformed());
        }
        (single, single, false)
    };

    if !(min <= first && first < max) {
        return Err(TimeSpecError::OutOfRange { field, value: first, min, max: max - 1 });
    }
    if last >= max {
        return Err(TimeSpecError::OutOfRange { field, value: last, min, max: max - 1 });
    }
    if first > last {
        return Err(TimeSpecError::InvertedRange { field, first, last });
    }
    if !exceptions.is_empty() && !is_range {
        return Err(malformed());
    }

    let mut removed = Vec::new();
    for exc in exceptions {
        let value = resolve(field, exc, names)?;
        if !(first <= value && value <= last) {
            return Err(TimeSpecError::BadException { field, value, first, last });
        }
        removed.push(value);
    }

    Ok((first..=last).step_by(step as usize).filter(|m| !removed.contains(m)).collect())
}

#[cfg(test)]
#[path = "timespec_tests.rs"]
mod tests;
