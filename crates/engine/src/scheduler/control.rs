// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control events: reload, state dump, shutdown.

use super::Scheduler;
use crate::error::EngineResult;
use crate::logger::Logger;
use crate::mailer::Mailer;
use crate::schedule;
use crate::supervisor::Spawner;
use chrono::NaiveDateTime;
use pcron_core::{Clock, LogLevel};
use std::path::Path;

impl<C: Clock, S: Spawner, M: Mailer> Scheduler<C, S, M> {
    /// SIGHUP: re-read the catalog and environment file. An invalid
    /// catalog leaves the current one in place; running instances are
    /// never disturbed either way.
    pub(super) fn on_reload(&mut self) -> EngineResult<()> {
        self.init_code = load_init_code(&self.dir, &self.log);

        match pcron_catalog::parse_file(&self.crontab_path(), &self.catalog_defaults()) {
            Ok(catalog) => self.install_catalog(catalog),
            Err(e) if e.is_empty() => {
                self.log.warn("main", "crontab is empty");
                self.install_catalog(pcron_catalog::Catalog::default());
            }
            Err(e) => {
                self.log.error("main", &e.to_string());
                self.log
                    .error("main", "cannot use crontab because it contains errors, keeping previous catalog");
            }
        }
        Ok(())
    }

    /// SIGUSR1: dump the whole scheduler state to the log. Only useful
    /// (and only done) when the log shows info records.
    pub(super) fn dump(&self) {
        if self.log.level() < LogLevel::Info {
            return;
        }

        let mut running: Vec<_> = self
            .queues
            .iter()
            .filter_map(|(_, q)| q.running.as_ref())
            .map(|r| (r.started_at, r.instance.id()))
            .collect();
        running.sort();
        let mut shown: Vec<String> = Vec::new();
        for (started_at, id) in &running {
            self.log.info("main", &format!("[running]   {}  {}", stamp(*started_at), id));
        }
        shown.extend(running.iter().map(|(_, id)| job_of(id)));

        let mut waiting: Vec<_> = self
            .queues
            .iter()
            .filter_map(|(_, q)| q.waiting.front())
            .map(|i| (i.scheduled_at, i.id()))
            .collect();
        waiting.sort();
        for (scheduled_at, id) in &waiting {
            self.log.info("main", &format!("[waiting]   {}  {}", stamp(*scheduled_at), id));
        }
        shown.extend(waiting.iter().map(|(_, id)| job_of(id)));

        let mut sleeping: Vec<_> = self
            .catalog
            .jobs
            .values()
            .filter(|def| def.active && !shown.contains(&def.name))
            .map(|def| {
                let activation = self.activation.get(&def.name).copied().unwrap_or_default();
                let record = self.store.record(&def.name).cloned().unwrap_or_default();
                let next = schedule::next_fire(def, &record, activation).map(|(_, at)| at);
                (next, def.name.clone())
            })
            .collect();
        sleeping.sort();
        for (next, name) in sleeping {
            let when = next.map(stamp).unwrap_or_else(|| "--------/----".to_string());
            self.log.info("main", &format!("[sleeping]  {when}  {name}"));
        }

        for def in self.catalog.jobs.values().filter(|def| !def.active) {
            self.log.info("main", &format!("[inactive]  --------/----  {}", def.name));
        }
    }

    /// SIGTERM/SIGINT: terminate all running process groups. Their exits
    /// are processed normally; the daemon allows a grace period for the
    /// queues to drain before the final state flush.
    pub(super) async fn on_shutdown(&mut self) -> EngineResult<()> {
        if self.shutting_down {
            return Ok(());
        }
        self.shutting_down = true;
        self.log.warn("main", "shutting down ...");

        for name in self.queues.names() {
            let target = {
                let Some(queue) = self.queues.get_mut(&name) else { continue };
                let dropped = queue.waiting.len();
                queue.waiting.clear();
                if dropped > 0 {
                    self.store.mark_dirty();
                }
                queue.running.as_mut().map(|r| {
                    r.kill_sent = true;
                    (r.instance.id(), r.handle.clone())
                })
            };
            if let Some((id, handle)) = target {
                self.log.info(&id, "terminating for shutdown");
                if let Err(e) = self.spawner.terminate(&handle).await {
                    self.log.warn(&id, &format!("cannot terminate: {e}"));
                }
            }
        }
        Ok(())
    }
}

/// Read `environment.sh`; a missing file is normal.
pub(super) fn load_init_code<C: Clock>(dir: &Path, log: &Logger<C>) -> String {
    let path = dir.join(crate::ENVIRONMENT_NAME);
    match std::fs::read_to_string(&path) {
        Ok(code) => code,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log.debug("main", &format!("{} not found", path.display()));
            String::new()
        }
        Err(e) => {
            log.error("main", &format!("{}: {e}", path.display()));
            String::new()
        }
    }
}

fn stamp(t: NaiveDateTime) -> String {
    t.format("%Y%m%d/%H%M").to_string()
}

fn job_of(instance_id: &str) -> String {
    instance_id.rsplit_once('-').map(|(job, _)| job.to_string()).unwrap_or_default()
}
