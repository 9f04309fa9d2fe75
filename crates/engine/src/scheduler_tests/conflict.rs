// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue contention: skip, kill, and ignore policies.

use crate::test_support::{default_start, minute, World};
use pcron_core::ExitDisposition;

/// Two 15-minute jobs on a 20-minute interval sharing one queue with
/// `skip` serialize into perfect alternation: each runs four times over
/// two hours.
#[tokio::test]
async fn queue_contention_with_skip() {
    let crontab = "\
[default]
interval = 20
queue = blk1
conflict = skip

[foo]
command = 15 0

[bar]
command = 15 0
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(120)).await;

    // Jobs are considered in lexicographic id order, so bar leads.
    assert_eq!(world.starts_of("bar"), vec![minute(0), minute(30), minute(60), minute(90)]);
    assert_eq!(world.starts_of("foo"), vec![minute(15), minute(45), minute(75), minute(105)]);

    // Dropped fires announce themselves.
    assert!(world.mailer.count_matching("conflict (skip)") > 0);
}

/// A job that outlives its own interval under `kill` preempts itself
/// forever: eight starts over two hours, none completing naturally.
#[tokio::test]
async fn self_preemption_with_kill() {
    let crontab = "\
[baz]
command = 20 0
interval = 15
conflict = kill
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(120)).await;

    let expected: Vec<_> = (0..8).map(|i| minute(i * 15)).collect();
    assert_eq!(world.starts_of("baz"), expected);

    // Every finished instance was killed by its successor; the last one is
    // still running at the end of the window.
    assert_eq!(world.record("baz").last_exit, Some(ExitDisposition::Killed));
    assert_eq!(world.mailer.count_matching("killed"), 7);
    assert_eq!(world.mailer.count_matching("conflict (kill)"), 7);
}

/// The new instance only becomes runnable after the killed one is gone
/// from the queue.
#[tokio::test]
async fn kill_never_overlaps_instances() {
    let crontab = "\
[baz]
command = 20 0
interval = 15
conflict = kill
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(46)).await;

    // Starts at 0, 15, 30, 45: strictly ordered, one at a time.
    let starts = world.starts_of("baz");
    assert_eq!(starts.len(), 4);
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(world.sched.queues().running_count(), 1);
}

/// `ignore` always appends; contention is only noted.
#[tokio::test]
async fn ignore_appends_through_contention() {
    let crontab = "\
[ign]
command = 10 0
interval = 5
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(21)).await;

    assert_eq!(world.starts_of("ign"), vec![minute(0), minute(10), minute(20)]);
    assert!(world.mailer.count_matching("conflict (ignore)") > 0);
}

/// With `skip`, at most one instance of a job is ever waiting.
#[tokio::test]
async fn skip_never_queues_two_waiters() {
    let crontab = "\
[slow]
command = 30 0
interval = 5
conflict = skip
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(29)).await;

    // One running since 0, exactly one waiter admitted at 5, the rest
    // dropped.
    assert_eq!(world.starts_of("slow"), vec![minute(0)]);
    let queue = world.sched.queues().get("slow").expect("queue exists");
    assert_eq!(queue.waiting_count("slow"), 1);
}
