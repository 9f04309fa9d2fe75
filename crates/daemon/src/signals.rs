// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal reception.
//!
//! Handlers do nothing except post a control event onto the engine's
//! queue; all real work happens in the main loop. SIGCHLD is consumed by
//! the runtime's child watchers, which post child-exit events themselves.

use pcron_core::{ControlEvent, Event};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Spawn the task that turns `HUP`/`USR1`/`TERM`/`INT` into control
/// events. Ends when the engine side of the channel is gone.
pub fn spawn_signal_task(event_tx: mpsc::Sender<Event>) -> std::io::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        loop {
            let control = tokio::select! {
                _ = hangup.recv() => ControlEvent::Reload,
                _ = user1.recv() => ControlEvent::DumpState,
                _ = terminate.recv() => ControlEvent::Shutdown,
                _ = interrupt.recv() => ControlEvent::Shutdown,
            };
            if event_tx.send(Event::Control(control)).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
