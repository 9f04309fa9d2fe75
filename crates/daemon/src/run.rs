// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real-time main loop.

use crate::config::Config;
use crate::lifecycle::{startup, LifecycleError, StartupResult};
use crate::signals::spawn_signal_task;
use chrono::NaiveDateTime;
use pcron_core::{next_minute, Clock, ControlEvent, Event, SystemClock};
use pcron_engine::KILL_GRACE_SECONDS;
use std::time::Duration;

/// Run the daemon until an orderly shutdown. The loop waits on the next
/// minute boundary, control events, and child exits; the engine is the
/// only task that ever touches scheduler state.
pub async fn run(config: &Config) -> Result<(), LifecycleError> {
    let StartupResult { mut scheduler, mut event_rx, event_tx, pid_file } =
        startup(config, true)?;
    spawn_signal_task(event_tx)?;

    let clock = SystemClock;
    loop {
        let next_tick = next_minute(clock.now());

        tokio::select! {
            received = event_rx.recv() => {
                let Some(event) = received else { break };
                let shutdown = matches!(event, Event::Control(ControlEvent::Shutdown));
                scheduler.handle(event).await;
                if shutdown {
                    drain(&mut scheduler, &mut event_rx).await;
                    break;
                }
            }
            _ = tokio::time::sleep(sleep_until(&clock, next_tick)) => {
                scheduler.handle(Event::Tick { now: next_tick }).await;
            }
        }
    }

    drop(pid_file);
    Ok(())
}

/// The "run one job now" entry point: fire a single job (startup jobs
/// included) and wait for it to finish. Returns whether it succeeded.
pub async fn run_single(config: &Config, job: &str) -> Result<bool, LifecycleError> {
    let StartupResult { mut scheduler, mut event_rx, event_tx, .. } = startup(config, false)?;
    drop(event_tx);

    scheduler
        .run_now(job)
        .await
        .map_err(|e| match e {
            pcron_engine::EngineError::NoSuchJob(name) => LifecycleError::NoSuchJob(name),
            other => other.into(),
        })?;

    // If nothing started (condition skip, spawn failure), don't let an
    // older record masquerade as this run's outcome.
    if scheduler.is_drained() {
        return Ok(false);
    }

    while !scheduler.is_drained() {
        let Some(event) = event_rx.recv().await else { break };
        scheduler.handle(event).await;
    }

    let success = scheduler
        .store()
        .record(job)
        .and_then(|record| record.last_exit.clone())
        .map(|exit| exit.is_success())
        .unwrap_or(false);
    Ok(success)
}

/// After a shutdown request, give the terminated children the kill grace
/// period to report back so their exits are recorded and mailed.
async fn drain(
    scheduler: &mut crate::lifecycle::DaemonScheduler,
    event_rx: &mut tokio::sync::mpsc::Receiver<Event>,
) {
    let deadline =
        tokio::time::Instant::now() + Duration::from_secs(KILL_GRACE_SECONDS + 2);
    while !scheduler.is_drained() {
        match tokio::time::timeout_at(deadline, event_rx.recv()).await {
            Ok(Some(event)) => scheduler.handle(event).await,
            Ok(None) => break,
            Err(_) => break,
        }
    }
}

fn sleep_until(clock: &SystemClock, next_tick: NaiveDateTime) -> Duration {
    let now = clock.now();
    (next_tick - now).to_std().unwrap_or(Duration::ZERO)
}
