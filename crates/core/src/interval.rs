// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relative interval expressions.
//!
//! An [`IntervalSpec`] is a compact duration like `1w2d`, `4h30` or `90`.
//! The accepted suffixes, in order, are `m` (months, fixed at 4 weeks),
//! `w` (weeks), `d` (days), `h` (hours), and a bare trailing number for
//! minutes. Suffixes are case-insensitive. Zero-length intervals are
//! rejected.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalSpecError {
    #[error("malformed interval: {0:?}")]
    Malformed(String),

    #[error("interval must not be zero")]
    Zero,
}

const MINUTES_PER_UNIT: [(char, i64); 4] = [
    ('m', 4 * 7 * 24 * 60),
    ('w', 7 * 24 * 60),
    ('d', 24 * 60),
    ('h', 60),
];

/// A parsed interval. Equality compares the resolved length.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    source: String,
    minutes: i64,
}

impl IntervalSpec {
    pub fn parse(value: &str) -> Result<Self, IntervalSpecError> {
        let minutes = parse_minutes(value)?;
        if minutes == 0 {
            return Err(IntervalSpecError::Zero);
        }
        Ok(Self { source: value.to_string(), minutes })
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes)
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// The interval as it was written.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for IntervalSpec {
    fn eq(&self, other: &Self) -> bool {
        self.minutes == other.minutes
    }
}

impl std::fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_minutes(value: &str) -> Result<i64, IntervalSpecError> {
    let malformed = || IntervalSpecError::Malformed(value.to_string());

    let mut total: i64 = 0;
    let mut rest = value;
    // Units must appear at most once each, in declining order of size.
    let mut next_unit = 0;

    while !rest.is_empty() {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(malformed());
        }
        let amount: i64 = digits.parse().map_err(|_| malformed())?;
        rest = &rest[digits.len()..];

        match rest.chars().next() {
            Some(c) => {
                let unit = c.to_ascii_lowercase();
                let position = MINUTES_PER_UNIT[next_unit..]
                    .iter()
                    .position(|&(u, _)| u == unit)
                    .ok_or_else(malformed)?;
                total += amount * MINUTES_PER_UNIT[next_unit + position].1;
                next_unit += position + 1;
                rest = &rest[c.len_utf8()..];
            }
            None => {
                // Bare trailing number: minutes.
                total += amount;
            }
        }
    }

    Ok(total)
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
