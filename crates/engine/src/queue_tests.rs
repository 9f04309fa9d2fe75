// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use pcron_core::Trigger;
use std::sync::Arc;

fn job(name: &str) -> Arc<pcron_catalog::JobDef> {
    Arc::new(pcron_catalog::JobDef {
        name: name.to_string(),
        command: "true".to_string(),
        active: true,
        time: None,
        interval: None,
        post: Vec::new(),
        condition: None,
        queue: "q".to_string(),
        conflict: pcron_catalog::Conflict::Ignore,
        warn: true,
        mail: pcron_catalog::MailPolicy::Error,
        mailto: "alice".to_string(),
        username: "alice".to_string(),
        hostname: "example.org".to_string(),
        sendmail: pcron_catalog::DEFAULT_SENDMAIL.to_string(),
    })
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 5).unwrap().and_hms_opt(h, m, 0).unwrap()
}

fn instance(name: &str, seq: u64) -> Instance {
    Instance::new(job(name), seq, Trigger::Interval, at(0, 0))
}

#[test]
fn waiting_counts_per_job() {
    let mut set = QueueSet::default();
    let q = set.entry("q");
    q.waiting.push_back(instance("a", 1));
    q.waiting.push_back(instance("b", 1));
    q.waiting.push_back(instance("a", 2));

    assert_eq!(q.waiting_count("a"), 2);
    assert_eq!(q.waiting_count("b"), 1);
    assert_eq!(q.remove_waiting("a"), 2);
    assert_eq!(q.waiting_count("a"), 0);
    assert_eq!(q.waiting.len(), 1);
}

#[test]
fn prune_drops_idle_queues_only() {
    let mut set = QueueSet::default();
    set.entry("idle");
    set.entry("busy").waiting.push_back(instance("a", 1));
    set.prune();

    assert!(set.get("idle").is_none());
    assert!(set.get("busy").is_some());
}

#[test]
fn running_markers_reflect_running_slots() {
    let mut set = QueueSet::default();
    let inst = instance("a", 3);
    set.entry("q").running = Some(RunningInstance {
        instance: inst,
        handle: ChildHandle { pid: Some(99), output_path: "/tmp/out".into() },
        started_at: at(1, 0),
        kill_sent: false,
    });
    set.entry("other");

    let markers = set.running_markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].job, "a");
    assert_eq!(markers[0].seq, 3);
    assert_eq!(markers[0].queue, "q");
    assert_eq!(markers[0].pid, Some(99));
    assert_eq!(set.running_count(), 1);
}

#[test]
fn instance_display_id() {
    assert_eq!(instance("backup", 7).id(), "backup-0007");
}
