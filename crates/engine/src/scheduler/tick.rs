// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The minute tick and queue advancement.

use super::Scheduler;
use crate::error::EngineResult;
use crate::instance::Instance;
use crate::mailer::{finished_mail, Mailer};
use crate::queue::RunningInstance;
use crate::schedule;
use crate::supervisor::{SpawnError, Spawner};
use chrono::NaiveDateTime;
use pcron_core::{Clock, ExitDisposition, InstanceState};

impl<C: Clock, S: Spawner, M: Mailer> Scheduler<C, S, M> {
    /// Minute boundary: consider every active job in lexicographic id
    /// order, then advance any queue whose running slot is free.
    pub(super) async fn on_tick(&mut self, now: NaiveDateTime) -> EngineResult<()> {
        if self.shutting_down {
            return Ok(());
        }

        let jobs: Vec<_> = self.catalog.jobs.values().cloned().collect();
        for def in jobs {
            if !def.active {
                continue;
            }
            let activation = self.activation.get(&def.name).copied().unwrap_or(now);
            let record = self.store.record(&def.name).cloned().unwrap_or_default();
            if let Some((trigger, at)) = schedule::next_fire(&def, &record, activation) {
                // A missed instant (downtime, slow tick) collapses into a
                // single recovery fire; the record advances to `now`.
                if at <= now {
                    self.fire(def, trigger, now).await?;
                }
            }
        }

        self.advance_queues().await
    }

    /// Start waiting instances on every queue with a free running slot.
    pub(super) async fn advance_queues(&mut self) -> EngineResult<()> {
        if self.shutting_down {
            return Ok(());
        }

        for name in self.queues.names() {
            loop {
                let instance = {
                    let Some(queue) = self.queues.get_mut(&name) else { break };
                    if queue.running.is_some() {
                        break;
                    }
                    match queue.waiting.pop_front() {
                        Some(instance) => instance,
                        None => break,
                    }
                };

                let mut instance = instance;
                instance.state = InstanceState::Ready;

                if !self.condition_holds(&instance).await {
                    continue;
                }

                match self.start_instance(instance).await {
                    Ok(running) => {
                        if let Some(queue) = self.queues.get_mut(&name) {
                            queue.running = Some(running);
                            self.store.mark_dirty();
                        }
                    }
                    Err((instance, e)) => {
                        self.failed_instance(instance, e).await;
                    }
                }
            }
        }

        self.queues.prune();
        Ok(())
    }

    /// Evaluate the instance's condition, if any. This is synchronous by
    /// design: the engine stands still until the condition process ends.
    async fn condition_holds(&mut self, instance: &Instance) -> bool {
        let Some(condition) = instance.job.condition.clone() else {
            return true;
        };
        let id = instance.id();

        let request = match self.spawn_request(instance, condition.clone()) {
            Ok(request) => request,
            Err(e) => {
                self.log.warn(&id, &format!("condition setup failed: {e} -> skip"));
                return false;
            }
        };
        match self.spawner.run_condition(request).await {
            Ok(0) => {
                self.log.debug(&id, &format!("condition {condition:?}: true"));
                true
            }
            Ok(code) => {
                self.log.info(&id, &format!("condition failed (exit {code}) -> skip"));
                false
            }
            Err(e) => {
                self.log.warn(&id, &format!("condition error: {e} -> skip"));
                false
            }
        }
    }

    async fn start_instance(
        &mut self,
        mut instance: Instance,
    ) -> Result<RunningInstance, (Instance, SpawnError)> {
        let request = match self.spawn_request(&instance, instance.job.command.clone()) {
            Ok(request) => request,
            Err(e) => return Err((instance, e)),
        };
        match self.spawner.spawn(request).await {
            Ok(handle) => {
                self.log.info(&instance.id(), &format!("execute: {}", instance.job.command));
                instance.state = InstanceState::Running;
                Ok(RunningInstance {
                    instance,
                    handle,
                    started_at: self.clock.now(),
                    kill_sent: false,
                })
            }
            Err(e) => Err((instance, e)),
        }
    }

    /// An instance that never ran: record and report it as an error
    /// outcome without touching the queue.
    async fn failed_instance(&mut self, instance: Instance, error: SpawnError) {
        let id = instance.id();
        self.log.warn(&id, &format!("cannot start: {error}"));

        let exit = ExitDisposition::Failed(error.to_string());
        let record = self.store.record_mut(&instance.job.name);
        record.last_exit = Some(exit.clone());
        record.last_end = Some(self.clock.now());

        self.send_mail(finished_mail(&instance.job, &id, &exit, "")).await;
    }
}
