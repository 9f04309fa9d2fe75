// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pcron_core::SystemClock;
use std::process::ExitStatus;

fn request(dir: &Path, command: &str) -> SpawnRequest {
    SpawnRequest {
        job: "j".to_string(),
        instance_id: "j-0001".to_string(),
        queue: "j".to_string(),
        seq: 1,
        command: command.to_string(),
        init_code: "GREETING=hello".to_string(),
        env: HashMap::from([("PATH".to_string(), "/usr/bin:/bin".to_string())]),
        working_dir: dir.join("jobs").join("j"),
        shell: PathBuf::from("/bin/sh"),
    }
}

#[test]
fn script_wraps_init_code_with_allexport() {
    let script = script_source("FOO=bar", "echo $FOO");
    assert_eq!(script, "set -ea\nFOO=bar\nset +ea\necho $FOO\n");
}

#[test]
fn classify_exit_codes() {
    use std::os::unix::process::ExitStatusExt;
    assert_eq!(classify_exit(ExitStatus::from_raw(0)), ExitDisposition::Exited(0));
    // Raw wait status 15 means "terminated by signal 15".
    assert_eq!(classify_exit(ExitStatus::from_raw(15)), ExitDisposition::Signaled(15));
    // Exit code 3 is encoded in the high byte.
    assert_eq!(classify_exit(ExitStatus::from_raw(3 << 8)), ExitDisposition::Exited(3));
}

#[tokio::test]
async fn spawn_captures_output_and_reports_exit() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let spawner = ShellSpawner::new(SystemClock, tx, Duration::from_secs(1));

    let handle = spawner
        .spawn(request(dir.path(), "echo \"$GREETING world\"; echo oops >&2; exit 3"))
        .await
        .unwrap();
    assert!(handle.pid.is_some());

    let event = rx.recv().await.expect("exit event");
    let Event::ChildExited { job, seq, exit, .. } = event else {
        panic!("unexpected event {event:?}");
    };
    assert_eq!(job, "j");
    assert_eq!(seq, 1);
    assert_eq!(exit, ExitDisposition::Exited(3));

    let output = std::fs::read_to_string(&handle.output_path).unwrap();
    assert!(output.contains("hello world"), "{output:?}");
    assert!(output.contains("oops"), "{output:?}");
}

#[tokio::test]
async fn condition_exit_code_is_returned_inline() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, _rx) = mpsc::channel(8);
    let spawner = ShellSpawner::new(SystemClock, tx, Duration::from_secs(1));

    let code = spawner.run_condition(request(dir.path(), "exit 7")).await.unwrap();
    assert_eq!(code, 7);
    let code = spawner.run_condition(request(dir.path(), "true")).await.unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn terminate_kills_the_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let spawner = ShellSpawner::new(SystemClock, tx, Duration::from_secs(1));

    let handle = spawner.spawn(request(dir.path(), "sleep 60")).await.unwrap();
    spawner.terminate(&handle).await.unwrap();

    let event = rx.recv().await.expect("exit event");
    let Event::ChildExited { exit, .. } = event else {
        panic!("unexpected event {event:?}");
    };
    assert_eq!(exit, ExitDisposition::Signaled(15));
}
