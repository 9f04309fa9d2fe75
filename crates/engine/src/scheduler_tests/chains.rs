// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-chain scheduling.

use crate::test_support::{default_start, minute, World};
use chrono::{NaiveDate, NaiveDateTime};

fn jan(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, day).unwrap().and_hms_opt(h, m, 0).unwrap()
}

/// A follow-up job with a daily fallback interval runs right after its
/// target's first completion, and only then: later completions inside the
/// same interval are held.
#[tokio::test]
async fn post_chain_follows_first_end_only() {
    let crontab = "\
[grault]
command = 5 0
time = 0 */8 * * *
queue = blk3

[garply]
command = 1 0
post = grault
interval = 1d
queue = blk3
conflict = skip
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(1440)).await;

    assert_eq!(world.starts_of("grault"), vec![minute(0), minute(480), minute(960)]);
    // Once, immediately after the first grault end at 00:05.
    assert_eq!(world.starts_of("garply"), vec![minute(5)]);
}

/// A post target that never fires leaves the follow-up to its interval.
#[tokio::test]
async fn unreachable_time_falls_back_to_interval() {
    // Day-of-month 6 never occurs inside the window (Jan 7 through Jan 8).
    let crontab = "\
[fred]
command = 1 0
time = 0 0 6 * *

[waldo]
command = 1 0
post = fred
interval = 1d
";
    let start = jan(6, 23, 59) + chrono::Duration::seconds(59);
    let mut world = World::new(crontab, start);
    world.run_until(jan(8, 0, 1)).await;

    assert!(world.starts_of("fred").is_empty());
    assert_eq!(world.starts_of("waldo"), vec![jan(8, 0, 0)]);

    let starts = world.spawner.starts();
    let waldo = starts.iter().find(|s| s.job == "waldo").unwrap();
    assert_eq!(waldo.instance_id, "waldo-0000");
}

/// A job chained after several targets waits for all of them, firing
/// right after whichever finishes last.
#[tokio::test]
async fn multi_post_waits_for_all_targets() {
    let crontab = "\
[plugh]
command = 1 0
interval = 20

[xyzzy]
command = 1 0
interval = 60

[thud]
command = 1 0
post = plugh xyzzy
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(120)).await;

    // plugh completes at 1, 21, 41, ...; xyzzy at 1, 61. thud fires once
    // per hour, after the later of the two.
    assert_eq!(world.starts_of("thud"), vec![minute(1), minute(61)]);
}

/// Killed targets still satisfy the post condition: any end counts.
#[tokio::test]
async fn killed_target_satisfies_post() {
    let crontab = "\
[victim]
command = 20 0
interval = 15
conflict = kill

[observer]
command = 1 0
post = victim
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(31)).await;

    // victim starts at 0, killed at 15; the observer follows each death.
    assert_eq!(world.starts_of("observer"), vec![minute(15), minute(30)]);
}

/// The post trigger is labeled as such on the fired instance.
#[tokio::test]
async fn post_fire_carries_post_trigger() {
    let crontab = "\
[seed]
command = 1 0
interval = 60

[follower]
command = 1 0
post = seed
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(3)).await;

    assert_eq!(world.starts_of("follower"), vec![minute(1)]);
    // The record advanced at the post fire.
    assert_eq!(world.record("follower").last_scheduled, Some(minute(1)));
    assert_eq!(world.record("follower").anchor, Some(minute(1)));
}
