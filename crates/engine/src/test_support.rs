// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic virtual-time harness.
//!
//! [`FakeSpawner`] simulates child processes the way the real supervisor
//! behaves, without starting any: a job command is `"<duration> <exit>"`
//! (duration in interval syntax), and the [`World`] pump delivers the exit
//! at the right virtual instant. At equal instants ticks are processed
//! before exits, matching the engine's real event ordering at minute
//! boundaries.

use crate::env::Identity;
use crate::logger::Logger;
use crate::mailer::{MailMessage, Mailer};
use crate::scheduler::{Scheduler, SchedulerDeps};
use crate::state::JobRecord;
use crate::supervisor::{ChildHandle, SpawnError, SpawnRequest, Spawner};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use pcron_core::{next_minute, Clock, ControlEvent, Event, ExitDisposition, IntervalSpec, VirtualClock};
use std::path::PathBuf;
use std::sync::Arc;

/// A started (possibly finished) fake child.
#[derive(Debug, Clone)]
struct FakeChild {
    queue: String,
    job: String,
    seq: u64,
    output_path: PathBuf,
    ends_at: NaiveDateTime,
    exit: ExitDisposition,
}

/// One recorded start, for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRecord {
    pub job: String,
    pub instance_id: String,
    pub at: NaiveDateTime,
}

#[derive(Default)]
struct FakeState {
    pending: Vec<FakeChild>,
    starts: Vec<StartRecord>,
    conditions: Vec<(String, i32)>,
}

/// Spawner double: parses `"<duration> <exit>"` commands and schedules
/// their exits in virtual time.
pub struct FakeSpawner {
    clock: VirtualClock,
    state: Mutex<FakeState>,
}

impl FakeSpawner {
    pub fn new(clock: VirtualClock) -> Self {
        Self { clock, state: Mutex::new(FakeState::default()) }
    }

    fn parse_command(command: &str) -> Result<(chrono::Duration, i32), SpawnError> {
        let mut parts = command.split_whitespace();
        let (Some(duration), Some(exit)) = (parts.next(), parts.next()) else {
            return Err(SpawnError::Io(std::io::Error::other(format!(
                "fake command must be '<duration> <exit>', got {command:?}"
            ))));
        };
        let duration = IntervalSpec::parse(duration)
            .map_err(|e| SpawnError::Io(std::io::Error::other(e.to_string())))?;
        let exit = exit
            .parse()
            .map_err(|_| SpawnError::Io(std::io::Error::other("bad exit code")))?;
        Ok((duration.duration(), exit))
    }

    /// Earliest pending exit, if any.
    pub fn next_end(&self) -> Option<NaiveDateTime> {
        self.state.lock().pending.iter().map(|c| c.ends_at).min()
    }

    /// Remove and return exit events due at or before `now`.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<Event> {
        let mut state = self.state.lock();
        let mut due: Vec<FakeChild> = Vec::new();
        state.pending.retain(|child| {
            if child.ends_at <= now {
                due.push(child.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| (a.ends_at, &a.job, a.seq).cmp(&(b.ends_at, &b.job, b.seq)));
        due.into_iter()
            .map(|c| Event::ChildExited {
                queue: c.queue,
                job: c.job,
                seq: c.seq,
                exit: c.exit,
                ended_at: c.ends_at,
            })
            .collect()
    }

    pub fn starts(&self) -> Vec<StartRecord> {
        self.state.lock().starts.clone()
    }

    pub fn condition_runs(&self) -> Vec<(String, i32)> {
        self.state.lock().conditions.clone()
    }
}

#[async_trait]
impl Spawner for FakeSpawner {
    async fn spawn(&self, req: SpawnRequest) -> Result<ChildHandle, SpawnError> {
        let (duration, exit) = Self::parse_command(&req.command)?;
        let now = self.clock.now();
        let output_path = req.working_dir.join(format!("output-{:04}.txt", req.seq));

        let mut state = self.state.lock();
        state.starts.push(StartRecord {
            job: req.job.clone(),
            instance_id: req.instance_id.clone(),
            at: now,
        });
        state.pending.push(FakeChild {
            queue: req.queue,
            job: req.job,
            seq: req.seq,
            output_path: output_path.clone(),
            ends_at: now + duration,
            exit: ExitDisposition::Exited(exit),
        });

        Ok(ChildHandle { pid: None, output_path })
    }

    async fn run_condition(&self, req: SpawnRequest) -> Result<i32, SpawnError> {
        let (_, exit) = Self::parse_command(&req.command)?;
        self.state.lock().conditions.push((req.instance_id, exit));
        Ok(exit)
    }

    async fn terminate(&self, handle: &ChildHandle) -> Result<(), SpawnError> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        for child in &mut state.pending {
            if child.output_path == handle.output_path {
                child.ends_at = now;
                child.exit = ExitDisposition::Signaled(15);
            }
        }
        Ok(())
    }
}

/// Mailer double that records composed messages.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.sent.lock().iter().filter(|m| m.subject.contains(needle)).count()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, message: MailMessage) {
        self.sent.lock().push(message);
    }
}

/// Identity used by every harness run.
pub fn fake_identity() -> Identity {
    Identity {
        username: "alice".to_string(),
        uid: 1000,
        gid: 100,
        home: PathBuf::from("/home/alice"),
        shell: PathBuf::from("/bin/sh"),
        hostname: "example.org".to_string(),
    }
}

/// Monday 1970-01-05, one second shy of midnight so the first tick lands
/// exactly on 00:00.
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 4).unwrap().and_hms_opt(23, 59, 59).unwrap()
}

/// An engine plus its doubles, driven in virtual time.
pub struct World {
    pub dir: tempfile::TempDir,
    pub clock: VirtualClock,
    pub spawner: Arc<FakeSpawner>,
    pub mailer: Arc<RecordingMailer>,
    pub sched: Scheduler<VirtualClock, FakeSpawner, RecordingMailer>,
}

impl World {
    pub fn new(crontab: &str, start: NaiveDateTime) -> World {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(crate::CRONTAB_NAME), crontab).expect("write crontab");
        Self::with_dir(dir, start)
    }

    /// Re-open an existing configuration directory, as a restart would.
    pub fn restart_at(self, start: NaiveDateTime) -> World {
        let World { dir, .. } = self;
        Self::with_dir(dir, start)
    }

    fn with_dir(dir: tempfile::TempDir, start: NaiveDateTime) -> World {
        let clock = VirtualClock::new(start);
        let spawner = Arc::new(FakeSpawner::new(clock.clone()));
        let mailer = Arc::new(RecordingMailer::default());
        let logger = Logger::to_file(
            clock.clone(),
            pcron_core::LogLevel::Debug,
            &dir.path().join(crate::LOGFILE_NAME),
        )
        .expect("logfile");
        let identity = fake_identity();

        let catalog = pcron_catalog::parse_file(
            &dir.path().join(crate::CRONTAB_NAME),
            &pcron_catalog::CatalogDefaults {
                username: identity.username.clone(),
                hostname: identity.hostname.clone(),
            },
        )
        .expect("valid crontab");

        let deps = SchedulerDeps {
            clock: clock.clone(),
            spawner: Arc::clone(&spawner),
            mailer: Arc::clone(&mailer),
            logger,
            identity,
            dir: dir.path().to_path_buf(),
        };
        let sched = Scheduler::new(deps, catalog);

        World { dir, clock, spawner, mailer, sched }
    }

    /// Pump ticks and child exits until `stop` (exclusive). Ticks are
    /// processed before exits due at the same instant.
    pub async fn run_until(&mut self, stop: NaiveDateTime) {
        loop {
            let next_tick = next_minute(self.clock.now());
            let next_end = self.spawner.next_end();
            let next_event = match next_end {
                Some(end) if end < next_tick => end,
                _ => next_tick,
            };
            if next_event >= stop {
                break;
            }
            self.clock.set(next_event);
            if next_event == next_tick {
                self.sched.handle(Event::Tick { now: next_tick }).await;
            }
            for event in self.spawner.take_due(self.clock.now()) {
                self.sched.handle(event).await;
            }
        }
    }

    /// Rewrite the crontab and deliver a reload event, as the external
    /// configuration tool would.
    pub async fn reload_crontab(&mut self, crontab: &str) {
        std::fs::write(self.dir.path().join(crate::CRONTAB_NAME), crontab)
            .expect("write crontab");
        self.sched.handle(Event::Control(ControlEvent::Reload)).await;
    }

    pub fn starts_of(&self, job: &str) -> Vec<NaiveDateTime> {
        self.spawner.starts().into_iter().filter(|s| s.job == job).map(|s| s.at).collect()
    }

    pub fn record(&self, job: &str) -> JobRecord {
        self.sched.store().record(job).cloned().unwrap_or_default()
    }
}

/// Minutes after the first tick (1970-01-05 00:00), for concise scenario
/// expectations.
pub fn minute(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap()
        + chrono::Duration::minutes(offset)
}
