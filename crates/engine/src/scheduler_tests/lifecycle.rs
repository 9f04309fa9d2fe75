// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reloads, conditions, startup jobs, shutdown, dump.

use crate::test_support::{default_start, minute, World};
use pcron_core::{Clock, ControlEvent, Event, ExitDisposition};

/// A reload never disturbs running instances: the removed job completes
/// under its old definition, no new instance of it starts, and jobs new
/// to the catalog are scheduled from the reload instant.
#[tokio::test]
async fn reload_preserves_running_instances() {
    let c1 = "\
[alpha]
command = 10 0
interval = 5
";
    let c2 = "\
[beta]
command = 1 0
interval = 5
";
    let mut world = World::new(c1, default_start());
    world.run_until(minute(3)).await;
    assert_eq!(world.starts_of("alpha"), vec![minute(0)]);

    world.reload_crontab(c2).await;
    world.run_until(minute(15)).await;

    // alpha finished at 10 and was recorded, but never restarted.
    assert_eq!(world.starts_of("alpha"), vec![minute(0)]);
    assert_eq!(world.record("alpha").last_exit, Some(ExitDisposition::Exited(0)));
    assert_eq!(world.record("alpha").last_end, Some(minute(10)));

    // beta was activated at the first tick after the reload (00:03).
    assert_eq!(world.starts_of("beta"), vec![minute(3), minute(8), minute(13)]);
}

/// An invalid replacement catalog is rejected; the engine keeps running
/// the previous one.
#[tokio::test]
async fn invalid_reload_keeps_current_catalog() {
    let crontab = "\
[steady]
command = 1 0
interval = 5
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(1)).await;

    world.reload_crontab("[broken\nnot even close\n").await;
    world.run_until(minute(11)).await;

    assert_eq!(world.starts_of("steady"), vec![minute(0), minute(5), minute(10)]);
    assert!(world.sched.catalog().jobs.contains_key("steady"));
}

/// An emptied crontab is accepted as "no jobs", distinct from an error.
#[tokio::test]
async fn empty_reload_clears_catalog() {
    let crontab = "\
[steady]
command = 1 0
interval = 5
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(1)).await;

    world.reload_crontab("# all jobs removed\n").await;
    world.run_until(minute(11)).await;

    assert_eq!(world.starts_of("steady"), vec![minute(0)]);
    assert!(world.sched.catalog().is_empty());
}

/// A failing condition suppresses the run and is logged as a skip, not a
/// failure.
#[tokio::test]
async fn condition_gates_execution() {
    let crontab = "\
[gated]
command = 1 0
condition = 1 7
interval = 5

[open]
command = 1 0
condition = 1 0
interval = 5
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(6)).await;

    assert!(world.starts_of("gated").is_empty());
    assert_eq!(world.starts_of("open"), vec![minute(0), minute(5)]);

    // Both conditions ran, each tick.
    let runs = world.spawner.condition_runs();
    assert_eq!(runs.iter().filter(|(id, _)| id.starts_with("gated")).count(), 2);
    // The skip is not an error outcome: nothing was recorded as an exit.
    assert!(world.record("gated").last_exit.is_none());
}

/// Startup jobs never fire from the main loop; the run-now entry point is
/// their only way in, and it leaves the schedule record untouched.
#[tokio::test]
async fn startup_jobs_only_run_on_request() {
    let crontab = "\
[boot]
command = 1 0

[ticker]
command = 1 0
interval = 5
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(11)).await;
    assert!(world.starts_of("boot").is_empty());

    world.sched.run_now("boot").await.unwrap();
    assert_eq!(world.starts_of("boot").len(), 1);
    assert!(world.record("boot").last_scheduled.is_none());

    assert!(world.sched.run_now("missing").await.is_err());
}

/// Shutdown terminates running process groups and stops firing; the
/// late exits are still recorded.
#[tokio::test]
async fn shutdown_terminates_and_drains() {
    let crontab = "\
[longrun]
command = 30 0
interval = 60
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(2)).await;
    assert!(!world.sched.is_drained());

    world.sched.handle(Event::Control(ControlEvent::Shutdown)).await;
    assert!(world.sched.is_shutting_down());

    // The kill lands immediately in virtual time.
    for event in world.spawner.take_due(world.clock.now()) {
        world.sched.handle(event).await;
    }
    assert!(world.sched.is_drained());
    assert_eq!(world.record("longrun").last_exit, Some(ExitDisposition::Killed));
}

/// The USR1 dump writes the scheduler state to the log at info level.
#[tokio::test]
async fn dump_writes_state_listing() {
    let crontab = "\
[default]
loglevel = info

[busy]
command = 30 0
interval = 60

[idle]
command = 1 0
time = 0 12 * * *

[off]
command = 1 0
interval = 5
active = no
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(1)).await;
    world.sched.handle(Event::Control(ControlEvent::DumpState)).await;

    let log = std::fs::read_to_string(world.dir.path().join(crate::LOGFILE_NAME)).unwrap();
    assert!(log.contains("[running]"), "{log}");
    assert!(log.contains("busy-0000"), "{log}");
    assert!(log.contains("[sleeping]"), "{log}");
    assert!(log.contains("idle"), "{log}");
    assert!(log.contains("[inactive]"), "{log}");
    assert!(log.contains("off"), "{log}");
}

/// Inactive jobs are retained but never fire.
#[tokio::test]
async fn inactive_jobs_never_fire() {
    let crontab = "\
[off]
command = 1 0
interval = 5
active = no
";
    let mut world = World::new(crontab, default_start());
    world.run_until(minute(16)).await;
    assert!(world.starts_of("off").is_empty());
    assert!(world.sched.catalog().jobs.contains_key("off"));
}
