// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine proper.
//!
//! One [`Scheduler`] per account. It owns the catalog, the queues, the
//! process supervisor handle, and the persistent state buffer, and is
//! driven exclusively through [`handle`](Scheduler::handle) from a single
//! event loop. Handlers are fallible-isolated: an error in one event's
//! processing is logged and never stops the engine.

mod child;
mod control;
mod fire;
mod tick;

use crate::env::Identity;
use crate::error::EngineResult;
use crate::logger::Logger;
use crate::mailer::{MailMessage, Mailer};
use crate::queue::QueueSet;
use crate::state::StateStore;
use crate::supervisor::{SpawnError, SpawnRequest, Spawner};
use crate::{CRONTAB_NAME, STATE_NAME};
use chrono::NaiveDateTime;
use pcron_catalog::{Catalog, CatalogDefaults};
use pcron_core::{next_minute, Clock, ControlEvent, Event, Trigger};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Construction-time dependencies.
pub struct SchedulerDeps<C: Clock, S: Spawner, M: Mailer> {
    pub clock: C,
    pub spawner: Arc<S>,
    pub mailer: Arc<M>,
    pub logger: Logger<C>,
    pub identity: Identity,
    /// The configuration directory (crontab, environment file, state, jobs).
    pub dir: PathBuf,
}

pub struct Scheduler<C: Clock, S: Spawner, M: Mailer> {
    clock: C,
    spawner: Arc<S>,
    mailer: Arc<M>,
    log: Logger<C>,
    identity: Identity,
    dir: PathBuf,

    catalog: Catalog,
    init_code: String,
    queues: QueueSet,
    store: StateStore,
    serials: BTreeMap<String, u64>,
    /// First tick after each scheduled job appeared (start or reload).
    activation: BTreeMap<String, NaiveDateTime>,
    shutting_down: bool,
}

impl<C: Clock, S: Spawner, M: Mailer> Scheduler<C, S, M> {
    /// Build the engine around an already-parsed catalog. Whether a parse
    /// failure at first start is fatal is the caller's policy, so the
    /// catalog comes in from outside; reloads are handled internally.
    pub fn new(deps: SchedulerDeps<C, S, M>, catalog: Catalog) -> Self {
        let SchedulerDeps { clock, spawner, mailer, logger, identity, dir } = deps;

        let (store, warnings) = StateStore::load(dir.join(STATE_NAME));
        for warning in &warnings {
            logger.warn("state", warning);
        }

        let init_code = control::load_init_code(&dir, &logger);

        let mut scheduler = Self {
            clock,
            spawner,
            mailer,
            log: logger,
            identity,
            dir,
            catalog: Catalog::default(),
            init_code,
            queues: QueueSet::default(),
            store,
            serials: BTreeMap::new(),
            activation: BTreeMap::new(),
            shutting_down: false,
        };
        scheduler.install_catalog(catalog);
        scheduler.reconcile_stale_running();
        scheduler
    }

    /// Process one event. Errors are logged, never propagated: a single
    /// bad job must not kill the engine.
    pub async fn handle(&mut self, event: Event) {
        let name = event.name();
        let result = match event {
            Event::Tick { now } => self.on_tick(now).await,
            Event::ChildExited { queue, job, seq, exit, ended_at } => {
                self.on_child_exit(&queue, &job, seq, exit, ended_at).await
            }
            Event::Control(ControlEvent::Reload) => self.on_reload(),
            Event::Control(ControlEvent::DumpState) => {
                self.dump();
                Ok(())
            }
            Event::Control(ControlEvent::Shutdown) => self.on_shutdown().await,
        };
        if let Err(e) = result {
            self.log.error("main", &format!("error while handling {name}: {e}"));
        }
        self.flush_state();
    }

    /// The "run one job now" entry point. Startup jobs are only reachable
    /// through here; scheduled jobs can be kicked off ahead of time. The
    /// trigger is invisible to the schedule evaluators.
    pub async fn run_now(&mut self, name: &str) -> EngineResult<()> {
        let def = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| crate::error::EngineError::NoSuchJob(name.to_string()))?;
        if !def.active {
            self.log.warn("main", &format!("{name}: inactive, not running"));
            return Ok(());
        }
        let now = self.clock.now();
        self.fire(def, Trigger::Manual, now).await?;
        self.advance_queues().await?;
        self.flush_state();
        Ok(())
    }

    /// Whether every queue has drained; the daemon waits for this (up to
    /// the grace period) after a shutdown request.
    pub fn is_drained(&self) -> bool {
        self.queues.running_count() == 0
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    fn crontab_path(&self) -> PathBuf {
        self.dir.join(CRONTAB_NAME)
    }

    fn catalog_defaults(&self) -> CatalogDefaults {
        CatalogDefaults {
            username: self.identity.username.clone(),
            hostname: self.identity.hostname.clone(),
        }
    }

    fn next_seq(&mut self, job: &str) -> u64 {
        let counter = self.serials.entry(job.to_string()).or_insert(0);
        let seq = *counter;
        *counter += 1;
        seq
    }

    /// Delivery is awaited inline; the engine accepts the suspension just
    /// as it does for condition evaluation.
    async fn send_mail(&self, message: Option<MailMessage>) {
        if let Some(message) = message {
            self.mailer.deliver(message).await;
        }
    }

    /// Swap in a new catalog. Running instances keep their old definitions;
    /// jobs new to the catalog are scheduled from the next tick.
    fn install_catalog(&mut self, catalog: Catalog) {
        let first_tick = next_minute(self.clock.now());
        for name in catalog.jobs.keys() {
            self.activation.entry(name.clone()).or_insert(first_tick);
        }
        self.activation.retain(|name, _| catalog.jobs.contains_key(name));
        self.log.set_level(catalog.loglevel);
        self.log.info(
            "main",
            &format!(
                "catalog loaded: {} scheduled, {} startup jobs",
                catalog.jobs.len(),
                catalog.startup.len()
            ),
        );
        self.catalog = catalog;
    }

    /// Instances recorded as running by a previous engine are gone by now;
    /// note them as ended with unknown status.
    fn reconcile_stale_running(&mut self) {
        let now = self.clock.now();
        for marker in self.store.take_stale_running() {
            let alive = marker
                .pid
                .map(|pid| nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok())
                .unwrap_or(false);
            if alive {
                self.log.warn(
                    "state",
                    &format!(
                        "{}-{:04} (pid {}) from the previous run is still alive, abandoning it",
                        marker.job,
                        marker.seq,
                        marker.pid.unwrap_or(-1)
                    ),
                );
            } else {
                self.log.warn(
                    "state",
                    &format!(
                        "{}-{:04} was running at shutdown; recording unknown exit",
                        marker.job, marker.seq
                    ),
                );
            }
            let record = self.store.record_mut(&marker.job);
            record.last_exit = Some(pcron_core::ExitDisposition::Unknown);
            record.last_end = Some(now);
        }
    }

    fn flush_state(&mut self) {
        let markers = self.queues.running_markers();
        if let Err(e) = self.store.flush_if_dirty(&markers) {
            self.log.warn("state", &format!("cannot write state file: {e}"));
        }
    }

    fn spawn_request(
        &self,
        instance: &crate::instance::Instance,
        command: String,
    ) -> Result<SpawnRequest, SpawnError> {
        let env =
            crate::env::child_env(&self.identity, &self.dir, &instance.id(), &instance.job.queue)?;
        Ok(SpawnRequest {
            job: instance.job.name.clone(),
            instance_id: instance.id(),
            queue: instance.job.queue.clone(),
            seq: instance.seq,
            command,
            init_code: self.init_code.clone(),
            env,
            working_dir: self.dir.join("jobs").join(&instance.job.name),
            shell: self.identity.shell.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../scheduler_tests/mod.rs"]
mod tests;
