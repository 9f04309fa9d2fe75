// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn job(mail: MailPolicy, warn: bool) -> JobDef {
    JobDef {
        name: "backup".to_string(),
        command: "run-backup".to_string(),
        active: true,
        time: None,
        interval: None,
        post: Vec::new(),
        condition: None,
        queue: "backup".to_string(),
        conflict: pcron_catalog::Conflict::Ignore,
        warn,
        mail,
        mailto: "ops".to_string(),
        username: "alice".to_string(),
        hostname: "example.org".to_string(),
        sendmail: "/usr/lib/sendmail".to_string(),
    }
}

#[test]
fn subject_carries_identity_and_outcome() {
    let def = job(MailPolicy::Always, true);
    let msg = finished_mail(&def, "backup-0001", &ExitDisposition::Exited(2), "").unwrap();
    assert_eq!(msg.subject, "alice@example.org: backup-0001 exit 2");
    assert_eq!(msg.mailto, "ops");
    assert!(msg.to_text().starts_with("From: pcron <alice>\nTo: ops\n"));
}

#[test]
fn error_policy_mails_failures_only() {
    let def = job(MailPolicy::Error, true);
    assert!(finished_mail(&def, "backup-0001", &ExitDisposition::Exited(0), "out").is_none());
    assert!(finished_mail(&def, "backup-0001", &ExitDisposition::Exited(1), "").is_some());
    assert!(finished_mail(&def, "backup-0001", &ExitDisposition::Killed, "").is_some());
}

#[test]
fn output_policy_mails_on_output_only() {
    let def = job(MailPolicy::Output, true);
    assert!(finished_mail(&def, "backup-0001", &ExitDisposition::Exited(1), "").is_none());
    let msg = finished_mail(&def, "backup-0001", &ExitDisposition::Exited(0), "two lines\nhere")
        .unwrap();
    assert!(msg.body.ends_with("two lines\nhere"));
}

#[test]
fn never_policy_suppresses_everything() {
    let def = job(MailPolicy::Never, true);
    assert!(finished_mail(&def, "backup-0001", &ExitDisposition::Killed, "x").is_none());
    assert!(conflict_mail(&def, "backup-0001", ConflictNotice::KillRunning).is_none());
}

#[test]
fn conflict_mail_requires_warn() {
    let def = job(MailPolicy::Error, false);
    assert!(conflict_mail(&def, "backup-0001", ConflictNotice::SkipWaiting).is_none());

    let def = job(MailPolicy::Error, true);
    let msg = conflict_mail(&def, "backup-0001", ConflictNotice::SkipWaiting).unwrap();
    assert_eq!(msg.subject, "alice@example.org: backup-0001 conflict (skip)");
    assert!(msg.body.contains("already waiting"));
}
