// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pid_file_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pcron.pid");

    {
        let pid_file = PidFile::create(path.clone()).unwrap();
        assert_eq!(pid_file.path(), path);
        assert_eq!(read_pid(&path), Some(std::process::id() as i32));
    }
    // Removed on drop.
    assert!(!path.exists());
}

#[test]
fn live_pid_blocks_second_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pcron.pid");
    // Our own pid is certainly alive.
    std::fs::write(&path, format!("{}\n", std::process::id())).unwrap();

    let err = PidFile::create(path).unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning(_)), "{err}");
}

#[test]
fn stale_pid_file_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pcron.pid");
    // A pid far above any default pid_max.
    std::fs::write(&path, "99999999\n").unwrap();

    let pid_file = PidFile::create(path.clone()).unwrap();
    assert_eq!(read_pid(&path), Some(std::process::id() as i32));
    drop(pid_file);
}

#[test]
fn garbage_pid_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pcron.pid");
    std::fs::write(&path, "not a pid\n").unwrap();
    assert_eq!(read_pid(&path), None);
}
