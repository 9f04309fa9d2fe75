// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firing decisions: conflict policy and queue admission.

use super::Scheduler;
use crate::error::EngineResult;
use crate::instance::Instance;
use crate::mailer::{conflict_mail, ConflictNotice, Mailer};
use crate::supervisor::Spawner;
use chrono::NaiveDateTime;
use pcron_catalog::{Conflict, JobDef};
use pcron_core::{Clock, Trigger};
use std::sync::Arc;

impl<C: Clock, S: Spawner, M: Mailer> Scheduler<C, S, M> {
    /// The engine has decided `def` should fire at `now`. Record the
    /// consideration, apply the conflict policy, and enqueue if admitted.
    pub(super) async fn fire(
        &mut self,
        def: Arc<JobDef>,
        trigger: Trigger,
        now: NaiveDateTime,
    ) -> EngineResult<()> {
        // The schedule record advances even when the conflict policy drops
        // the instance; otherwise the same fire would repeat every tick.
        if trigger != Trigger::Manual {
            let record = self.store.record_mut(&def.name);
            record.last_scheduled = Some(now);
            record.anchor = Some(now);
            record.post_seen.clear();
        }

        let queue_name = def.queue.clone();
        let (waiting, running_same) = {
            let queue = self.queues.entry(&queue_name);
            (queue.waiting_count(&def.name), queue.running_job() == Some(def.name.as_str()))
        };

        let admitted = match def.conflict {
            Conflict::Ignore => {
                if waiting > 0 || running_same {
                    self.log.warn(
                        &def.name,
                        "scheduling conflict: another instance is active -> ignore",
                    );
                    self.send_mail(conflict_mail(
                        &def,
                        &def.name,
                        ConflictNotice::IgnoreContention,
                    ))
                    .await;
                }
                true
            }
            Conflict::Skip => {
                if waiting > 0 {
                    self.log.warn(&def.name, "scheduling conflict: wait congestion -> skip");
                    self.send_mail(conflict_mail(&def, &def.name, ConflictNotice::SkipWaiting))
                        .await;
                    false
                } else {
                    true
                }
            }
            Conflict::Kill => {
                if running_same {
                    self.kill_running(&queue_name, &def).await;
                }
                let dropped = self.queues.entry(&queue_name).remove_waiting(&def.name);
                if dropped > 0 {
                    self.log
                        .debug(&def.name, &format!("superseded {dropped} waiting instance(s)"));
                }
                true
            }
        };

        if admitted {
            let seq = self.next_seq(&def.name);
            let instance = Instance::new(def, seq, trigger, now);
            self.log.debug(
                &instance.id(),
                &format!("enqueue into {queue_name} (trigger: {trigger})"),
            );
            self.queues.entry(&queue_name).waiting.push_back(instance);
            self.store.mark_dirty();
        }
        Ok(())
    }

    /// Conflict `kill`: terminate the running instance of this job. Its
    /// death arrives later as a normal child-exit event; the new instance
    /// waits in the queue until then.
    async fn kill_running(&mut self, queue_name: &str, def: &JobDef) {
        let target = {
            let queue = self.queues.entry(queue_name);
            match queue.running.as_mut() {
                Some(running) if running.instance.job.name == def.name => {
                    running.kill_sent = true;
                    Some((running.instance.id(), running.handle.clone()))
                }
                _ => None,
            }
        };
        let Some((victim_id, handle)) = target else {
            return;
        };

        self.log.warn(&victim_id, "scheduling conflict: exceeding runtime -> kill");
        self.send_mail(conflict_mail(def, &victim_id, ConflictNotice::KillRunning)).await;
        if let Err(e) = self.spawner.terminate(&handle).await {
            // Signal-delivery failures are logged and ignored.
            self.log.warn(&victim_id, &format!("cannot terminate: {e}"));
        }
    }
}
