// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-exit handling and post-chain firing.

use super::Scheduler;
use crate::error::EngineResult;
use crate::mailer::{finished_mail, Mailer};
use crate::schedule;
use crate::supervisor::Spawner;
use chrono::NaiveDateTime;
use pcron_core::{Clock, ExitDisposition, Trigger};
use std::path::Path;

/// How much captured output is carried into events and mail.
const OUTPUT_LIMIT: usize = 64 * 1024;

impl<C: Clock, S: Spawner, M: Mailer> Scheduler<C, S, M> {
    /// A child ended: record the result, mail per policy, satisfy post
    /// chains, then promote the queue.
    pub(super) async fn on_child_exit(
        &mut self,
        queue: &str,
        job: &str,
        seq: u64,
        exit: ExitDisposition,
        ended_at: NaiveDateTime,
    ) -> EngineResult<()> {
        let running = {
            let matching = self.queues.get_mut(queue).and_then(|q| {
                let matches = q
                    .running
                    .as_ref()
                    .is_some_and(|r| r.instance.job.name == job && r.instance.seq == seq);
                if matches {
                    q.running.take()
                } else {
                    None
                }
            });
            match matching {
                Some(running) => running,
                None => {
                    self.log.warn("main", &format!("stray exit event for {job}-{seq:04}"));
                    return Ok(());
                }
            }
        };

        // A signal death we asked for is a kill, not an accident.
        let exit = match exit {
            ExitDisposition::Signaled(_) if running.kill_sent => ExitDisposition::Killed,
            other => other,
        };

        let id = running.instance.id();
        if exit.is_success() {
            self.log.info(&id, "exit status: 0");
        } else {
            self.log.warn(&id, &format!("exit status: {}", exit.outcome()));
        }

        let record = self.store.record_mut(job);
        record.last_exit = Some(exit.clone());
        record.last_end = Some(ended_at);

        let output = read_output(&running.handle.output_path);
        self.send_mail(finished_mail(&running.instance.job, &id, &exit, &output)).await;

        self.fire_post_chains(job, ended_at).await?;
        self.advance_queues().await
    }

    /// Any end of `ended` (clean, failed, or killed) counts toward the
    /// post condition of its followers. A follower fires the moment every
    /// one of its targets has ended since its own last fire, rate-limited
    /// by its interval if it has one.
    async fn fire_post_chains(&mut self, ended: &str, ended_at: NaiveDateTime) -> EngineResult<()> {
        let followers: Vec<_> = self
            .catalog
            .jobs
            .values()
            .filter(|def| def.active && def.post.iter().any(|t| t == ended))
            .cloned()
            .collect();

        for def in followers {
            let record = self.store.record_mut(&def.name);
            record.post_seen.insert(ended.to_string());

            let satisfied = def.post.iter().all(|t| record.post_seen.contains(t));
            if !satisfied {
                continue;
            }
            if !schedule::post_gate_open(&def, record, ended_at) {
                self.log.debug(
                    &def.name,
                    "post targets ended but interval not yet elapsed -> hold",
                );
                continue;
            }
            self.fire(def, Trigger::Post, ended_at).await?;
        }
        Ok(())
    }
}

fn read_output(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) if bytes.len() > OUTPUT_LIMIT => {
            let mut text = String::from_utf8_lossy(&bytes[..OUTPUT_LIMIT]).into_owned();
            text.push_str("\n[output truncated]\n");
            text
        }
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}
