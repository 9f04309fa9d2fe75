// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn outcome_labels() {
    assert_eq!(ExitDisposition::Exited(0).outcome(), "ok");
    assert_eq!(ExitDisposition::Exited(3).outcome(), "exit 3");
    assert_eq!(ExitDisposition::Signaled(15).outcome(), "signal 15");
    assert_eq!(ExitDisposition::Killed.outcome(), "killed");
    assert_eq!(ExitDisposition::Failed("no shell".into()).outcome(), "error");
}

#[test]
fn success_is_exit_zero_only() {
    assert!(ExitDisposition::Exited(0).is_success());
    assert!(!ExitDisposition::Exited(1).is_success());
    assert!(!ExitDisposition::Killed.is_success());
    assert!(!ExitDisposition::Unknown.is_success());
}
