// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pcron scheduling engine.
//!
//! Single-threaded over its own structures: the [`Scheduler`] is the sole
//! mutator of queues, the catalog pointer, and the persistent state buffer.
//! Child processes are the only true parallelism; their exits, the minute
//! tick, and signal-driven control requests all arrive as [`pcron_core::Event`]s
//! on one queue.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod error;
mod instance;
mod logger;
mod mailer;
mod queue;
mod schedule;
mod scheduler;
mod state;
mod supervisor;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use env::{child_env, Identity, SUPPORTED_SHELLS};
pub use error::{EngineError, EngineResult};
pub use instance::Instance;
pub use logger::Logger;
pub use mailer::{MailMessage, Mailer, SendmailMailer};
pub use queue::{Queue, QueueSet, RunningInstance};
pub use scheduler::{Scheduler, SchedulerDeps};
pub use state::{JobRecord, RunningMarker, StateStore};
pub use supervisor::{ChildHandle, ShellSpawner, SpawnError, SpawnRequest, Spawner};

/// File names inside the configuration directory.
pub const CRONTAB_NAME: &str = "crontab.ini";
pub const ENVIRONMENT_NAME: &str = "environment.sh";
pub const LOGFILE_NAME: &str = "logfile.txt";
pub const STATE_NAME: &str = "state.json";
pub const PID_NAME: &str = "pcron.pid";

/// Grace period between SIGTERM and SIGKILL when terminating a job.
pub const KILL_GRACE_SECONDS: u64 = 10;
