// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, d).unwrap().and_hms_opt(h, m, 0).unwrap()
}

#[test]
fn roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let (mut store, warnings) = StateStore::load(path.clone());
    assert!(warnings.is_empty());

    {
        let rec = store.record_mut("backup");
        rec.last_scheduled = Some(at(5, 3, 30));
        rec.anchor = Some(at(5, 3, 30));
        rec.last_exit = Some(ExitDisposition::Exited(0));
        rec.last_end = Some(at(5, 3, 31));
        rec.post_seen.insert("seed".to_string());
    }
    let markers = vec![RunningMarker {
        job: "backup".to_string(),
        seq: 4,
        queue: "backup".to_string(),
        pid: Some(4242),
    }];
    store.flush_if_dirty(&markers).unwrap();
    assert!(!store.is_dirty());

    let (mut reloaded, warnings) = StateStore::load(path);
    assert!(warnings.is_empty());
    assert_eq!(reloaded.record("backup"), store.record("backup"));
    assert_eq!(reloaded.take_stale_running(), markers);
}

#[test]
fn missing_file_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let (store, warnings) = StateStore::load(dir.path().join("state.json"));
    assert!(warnings.is_empty());
    assert!(store.record("anything").is_none());
}

#[test]
fn corrupt_file_warns_and_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json at all").unwrap();

    let (store, warnings) = StateStore::load(path);
    assert_eq!(warnings.len(), 1);
    assert!(store.record("anything").is_none());
}

#[test]
fn obsolete_tag_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"tag": 0, "jobs": {"old": {}}, "running": []}"#).unwrap();

    let (store, warnings) = StateStore::load(path);
    assert_eq!(warnings.len(), 1);
    assert!(store.record("old").is_none());
}

#[test]
fn flush_is_debounced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let (mut store, _) = StateStore::load(path.clone());

    store.flush_if_dirty(&[]).unwrap();
    assert!(!path.exists(), "clean store should not write");

    store.record_mut("j");
    store.flush_if_dirty(&[]).unwrap();
    assert!(path.exists());
}

#[test]
fn records_survive_for_absent_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let (mut store, _) = StateStore::load(path.clone());
    store.record_mut("gone").last_end = Some(at(5, 1, 0));
    store.flush_if_dirty(&[]).unwrap();

    // A later engine that never touches "gone" still keeps its record.
    let (mut reloaded, _) = StateStore::load(path.clone());
    reloaded.record_mut("other");
    reloaded.flush_if_dirty(&[]).unwrap();

    let (after, _) = StateStore::load(path);
    assert_eq!(after.record("gone").unwrap().last_end, Some(at(5, 1, 0)));
}
