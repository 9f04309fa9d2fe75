// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durability across engine restarts.

use crate::test_support::{default_start, minute, World};
use chrono::Duration;
use pcron_core::ExitDisposition;

/// Restarting between minute boundaries neither double-fires a calendar
/// job for a minute it already handled nor skips one it had not reached.
#[tokio::test]
async fn calendar_is_idempotent_across_restart() {
    let crontab = "\
[daily]
command = 1 0
time = 30 0 * * *
";
    // Fire at 00:30, then restart at 00:30:40.
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(31)).await;
    assert_eq!(world.starts_of("daily"), vec![minute(30)]);

    let mut world = world.restart_at(minute(30) + Duration::seconds(40));
    world.run_until(minute(40)).await;
    assert!(world.starts_of("daily").is_empty(), "no double fire for the same minute");

    // Now the other side: stop just before the minute, restart, and the
    // fire must still happen.
    let crontab2 = "\
[daily2]
command = 1 0
time = 30 0 * * *
";
    let mut world = World::new(crontab2, default_start());
    world.run_until(minute(29)).await;
    assert!(world.starts_of("daily2").is_empty());

    let mut world = world.restart_at(minute(29) + Duration::seconds(30));
    world.run_until(minute(31)).await;
    assert_eq!(world.starts_of("daily2"), vec![minute(30)]);
}

/// Interval jobs never backfill: after two hours of downtime a
/// 30-minute job fires exactly once on recovery, then resumes cadence.
#[tokio::test]
async fn interval_does_not_backfill() {
    let crontab = "\
[corge]
command = 1 0
interval = 30
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(31)).await;
    assert_eq!(world.starts_of("corge"), vec![minute(0), minute(30)]);

    // Down from 00:31 to 02:30; four fires were missed.
    let mut world = world.restart_at(minute(150) + Duration::seconds(30));
    world.run_until(minute(212)).await;

    assert_eq!(world.starts_of("corge"), vec![minute(151), minute(181), minute(211)]);
}

/// An instance recorded as running at shutdown whose process is gone is
/// recovered as ended-with-unknown-status, with a warning.
#[tokio::test]
async fn stale_running_instance_is_reconciled() {
    let crontab = "\
[sleepy]
command = 30 0
interval = 60
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(5)).await;
    assert_eq!(world.sched.queues().running_count(), 1);

    // Crash: no shutdown, just a new engine over the same directory.
    let world = world.restart_at(minute(6));
    assert_eq!(world.record("sleepy").last_exit, Some(ExitDisposition::Unknown));

    let log = std::fs::read_to_string(world.dir.path().join(crate::LOGFILE_NAME)).unwrap();
    assert!(log.contains("was running at shutdown"), "{log}");
}

/// The last-scheduled instant survives a restart, so a long-interval job
/// does not refire early.
#[tokio::test]
async fn interval_anchor_survives_restart() {
    let crontab = "\
[hourly]
command = 1 0
interval = 60
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(2)).await;
    assert_eq!(world.starts_of("hourly"), vec![minute(0)]);

    let mut world = world.restart_at(minute(10));
    world.run_until(minute(61)).await;
    assert_eq!(world.starts_of("hourly"), vec![minute(60)]);
}
