// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Next-fire computation.
//!
//! Calendar and interval sources are evaluated here against the job's
//! persistent record; post-chain firing is event-driven and lives in the
//! scheduler's child-exit handler. The effective next fire is the minimum
//! over configured sources, the calendar winning ties.

use crate::state::JobRecord;
use chrono::{Duration, NaiveDateTime};
use pcron_catalog::JobDef;
use pcron_core::Trigger;

/// Earliest instant at which the job's calendar or interval wants to fire.
///
/// `activation` is the first tick after the job appeared (engine start or
/// reload); a job that has never fired anchors there. A job with a `post`
/// source treats its interval as a fallback cadence: no immediate first
/// fire, the timer starts running at activation.
pub fn next_fire(
    def: &JobDef,
    record: &JobRecord,
    activation: NaiveDateTime,
) -> Option<(Trigger, NaiveDateTime)> {
    let calendar = def.time.as_ref().and_then(|spec| {
        let after = match record.last_scheduled {
            Some(last) => last + Duration::minutes(1),
            None => activation,
        };
        spec.next_match(after)
    });

    let interval = def.interval.as_ref().map(|spec| match record.anchor {
        Some(anchor) => anchor + spec.duration(),
        None if def.post.is_empty() => activation,
        None => activation + spec.duration(),
    });

    match (calendar, interval) {
        (Some(t), Some(i)) if t <= i => Some((Trigger::Time, t)),
        (_, Some(i)) => Some((Trigger::Interval, i)),
        (Some(t), None) => Some((Trigger::Time, t)),
        (None, None) => None,
    }
}

/// Whether a post-chain trigger may fire now. When the job also has an
/// interval, post triggers are rate-limited to one per interval; the first
/// trigger is always allowed.
pub fn post_gate_open(def: &JobDef, record: &JobRecord, now: NaiveDateTime) -> bool {
    match (&def.interval, record.last_scheduled) {
        (Some(interval), Some(last)) => now >= last + interval.duration(),
        _ => true,
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
