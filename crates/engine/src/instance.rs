// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single scheduled execution of a job.

use chrono::NaiveDateTime;
use pcron_catalog::JobDef;
use pcron_core::{InstanceState, Trigger};
use std::sync::Arc;

/// One scheduled execution. Carries a snapshot of its job definition, so a
/// catalog reload never disturbs instances already created.
#[derive(Debug, Clone)]
pub struct Instance {
    pub job: Arc<JobDef>,
    /// Monotonically increasing per job.
    pub seq: u64,
    pub trigger: Trigger,
    pub scheduled_at: NaiveDateTime,
    pub state: InstanceState,
}

impl Instance {
    pub fn new(job: Arc<JobDef>, seq: u64, trigger: Trigger, scheduled_at: NaiveDateTime) -> Self {
        Self { job, seq, trigger, scheduled_at, state: InstanceState::Pending }
    }

    /// Display id, e.g. `backup-0007`.
    pub fn id(&self) -> String {
        format!("{}-{:04}", self.job.name, self.seq)
    }
}
