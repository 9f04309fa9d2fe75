// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance lifecycle vocabulary.
//!
//! An instance is one scheduled execution of a job. The engine moves it
//! through `Pending → Ready → Running → Ended`; the transitions themselves
//! live in the engine crate, these are the shared tags.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceState {
    /// In a queue, not yet at the head.
    Pending,
    /// At the head of its queue, condition not yet evaluated.
    Ready,
    /// Child process alive.
    Running,
    /// Awaiting post-processing.
    Ended,
}

crate::simple_display! {
    InstanceState {
        Pending => "pending",
        Ready => "ready",
        Running => "running",
        Ended => "ended",
    }
}

/// What caused an instance to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Calendar expression matched.
    Time,
    /// Interval elapsed.
    Interval,
    /// All post targets ended.
    Post,
    /// The run-one-job-now entry point.
    Manual,
}

crate::simple_display! {
    Trigger {
        Time => "time",
        Interval => "interval",
        Post => "post",
        Manual => "manual",
    }
}

/// How an instance's child process (or its setup) finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitDisposition {
    /// Process exited with the given code.
    Exited(i32),
    /// Process died on a signal it received from elsewhere.
    Signaled(i32),
    /// Process was terminated by the engine (conflict `kill` or shutdown).
    Killed,
    /// The instance never ran: environment or spawn failure.
    Failed(String),
    /// The engine could not observe the exit (recovered after a crash).
    Unknown,
}

impl ExitDisposition {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitDisposition::Exited(0))
    }

    /// Short outcome label used in log lines and mail subjects.
    pub fn outcome(&self) -> String {
        match self {
            ExitDisposition::Exited(0) => "ok".to_string(),
            ExitDisposition::Exited(code) => format!("exit {code}"),
            ExitDisposition::Signaled(sig) => format!("signal {sig}"),
            ExitDisposition::Killed => "killed".to_string(),
            ExitDisposition::Failed(_) => "error".to_string(),
            ExitDisposition::Unknown => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
