// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named FIFO queues with an at-most-one running token each.

use crate::instance::Instance;
use crate::state::RunningMarker;
use crate::supervisor::ChildHandle;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, VecDeque};

/// The queue's single running slot.
#[derive(Debug)]
pub struct RunningInstance {
    pub instance: Instance,
    pub handle: ChildHandle,
    pub started_at: NaiveDateTime,
    /// Set when the engine has asked this instance to terminate, so its
    /// signal death is reported as "killed" rather than a stray signal.
    pub kill_sent: bool,
}

#[derive(Debug, Default)]
pub struct Queue {
    pub waiting: VecDeque<Instance>,
    pub running: Option<RunningInstance>,
}

impl Queue {
    pub fn is_idle(&self) -> bool {
        self.waiting.is_empty() && self.running.is_none()
    }

    /// Pending-or-ready instances of one job.
    pub fn waiting_count(&self, job: &str) -> usize {
        self.waiting.iter().filter(|i| i.job.name == job).count()
    }

    pub fn running_job(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.instance.job.name.as_str())
    }

    /// Remove all waiting instances of one job; returns how many.
    pub fn remove_waiting(&mut self, job: &str) -> usize {
        let before = self.waiting.len();
        self.waiting.retain(|i| i.job.name != job);
        before - self.waiting.len()
    }
}

/// All queues, created on demand and dropped when idle.
#[derive(Debug, Default)]
pub struct QueueSet {
    queues: BTreeMap<String, Queue>,
}

impl QueueSet {
    pub fn entry(&mut self, name: &str) -> &mut Queue {
        self.queues.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Queue> {
        self.queues.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Queue> {
        self.queues.get_mut(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.queues.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Queue)> {
        self.queues.iter()
    }

    /// Drop queues with nothing waiting and nothing running.
    pub fn prune(&mut self) {
        self.queues.retain(|_, q| !q.is_idle());
    }

    /// Snapshot of running instances for the persistent state file.
    pub fn running_markers(&self) -> Vec<RunningMarker> {
        self.queues
            .iter()
            .filter_map(|(name, q)| {
                q.running.as_ref().map(|r| RunningMarker {
                    job: r.instance.job.name.clone(),
                    seq: r.instance.seq,
                    queue: name.clone(),
                    pid: r.handle.pid,
                })
            })
            .collect()
    }

    /// Engine-wide invariant: at most one running instance per queue holds
    /// structurally; this checks the per-queue slot is consistent.
    pub fn running_count(&self) -> usize {
        self.queues.values().filter(|q| q.running.is_some()).count()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
