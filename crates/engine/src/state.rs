// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent per-job state.
//!
//! A single JSON file, rewritten through a temporary sibling and a rename
//! so a crash mid-write leaves the previous version intact. Mutations mark
//! the store dirty; the engine flushes at the end of each event-handling
//! step, which debounces the many mutations of a single tick into one
//! rewrite.

use chrono::NaiveDateTime;
use pcron_core::ExitDisposition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Bumped when the on-disk layout changes; obsolete state is ignored.
const STATE_TAG: u32 = 1;

/// Everything the engine remembers about a job across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Last instant the job was considered for firing.
    pub last_scheduled: Option<NaiveDateTime>,
    /// Interval timer anchor: the job's last fire. Unset means the job
    /// has never fired since it appeared.
    pub anchor: Option<NaiveDateTime>,
    /// Exit disposition of the last completed instance.
    pub last_exit: Option<ExitDisposition>,
    /// End time of the last completed instance.
    pub last_end: Option<NaiveDateTime>,
    /// Post targets that have ended since this job's own last fire.
    #[serde(default)]
    pub post_seen: BTreeSet<String>,
}

/// An instance that was running when the state was last written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningMarker {
    pub job: String,
    pub seq: u64,
    pub queue: String,
    pub pid: Option<i32>,
}

#[derive(Serialize, Deserialize)]
struct StateFile {
    tag: u32,
    jobs: BTreeMap<String, JobRecord>,
    #[serde(default)]
    running: Vec<RunningMarker>,
}

/// The store. Records for jobs absent from the catalog are retained so a
/// reappearing job finds its history.
pub struct StateStore {
    path: PathBuf,
    jobs: BTreeMap<String, JobRecord>,
    /// Markers found on load; the scheduler reconciles and drains them.
    stale_running: Vec<RunningMarker>,
    dirty: bool,
}

impl StateStore {
    /// Load the store, tolerating a missing or unusable file. Problems are
    /// reported as warnings for the caller to log; durability is
    /// best-effort by design.
    pub fn load(path: PathBuf) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut jobs = BTreeMap::new();
        let mut stale_running = Vec::new();

        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<StateFile>(&bytes) {
                Ok(state) if state.tag == STATE_TAG => {
                    jobs = state.jobs;
                    stale_running = state.running;
                }
                Ok(_) => warnings.push("ignoring obsolete state file".to_string()),
                Err(e) => warnings.push(format!("ignoring unreadable state file: {e}")),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warnings.push(format!("cannot read state file: {e}")),
        }

        (Self { path, jobs, stale_running, dirty: false }, warnings)
    }

    pub fn record(&self, job: &str) -> Option<&JobRecord> {
        self.jobs.get(job)
    }

    /// Mutable access marks the store dirty.
    pub fn record_mut(&mut self, job: &str) -> &mut JobRecord {
        self.dirty = true;
        self.jobs.entry(job.to_string()).or_default()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Instances recorded as running by the previous engine, for recovery.
    pub fn take_stale_running(&mut self) -> Vec<RunningMarker> {
        std::mem::take(&mut self.stale_running)
    }

    /// Rewrite the file if anything changed. On failure the store stays
    /// dirty, so the next flush retries.
    pub fn flush_if_dirty(&mut self, running: &[RunningMarker]) -> std::io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write(running)?;
        self.dirty = false;
        Ok(())
    }

    fn write(&self, running: &[RunningMarker]) -> std::io::Result<()> {
        let state =
            StateFile { tag: STATE_TAG, jobs: self.jobs.clone(), running: running.to_vec() };
        let json = serde_json::to_vec_pretty(&state)?;

        let parent = self.path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        std::io::Write::write_all(&mut tmp, &json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
