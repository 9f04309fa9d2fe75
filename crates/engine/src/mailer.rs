// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result and conflict mail.
//!
//! Messages are composed here and handed to a [`Mailer`] for delivery. The
//! real mailer pipes the message into a sendmail-compatible program; tests
//! record messages instead.

use async_trait::async_trait;
use pcron_catalog::{JobDef, MailPolicy};
use pcron_core::{Clock, ExitDisposition};
use std::process::Stdio;

use crate::logger::Logger;

/// A composed message, ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub sendmail: String,
    pub mailto: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Render as an RFC-ish text message for the sendmail pipe.
    pub fn to_text(&self) -> String {
        format!(
            "From: pcron <{}>\nTo: {}\nSubject: {}\n\n{}",
            self.from, self.mailto, self.subject, self.body
        )
    }
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn deliver(&self, message: MailMessage);
}

/// Why a conflict notice is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictNotice {
    /// An instance was dropped because one was already waiting.
    SkipWaiting,
    /// A running instance was killed in favor of a new one.
    KillRunning,
    /// A new instance was appended although one is still active.
    IgnoreContention,
}

/// Compose the end-of-instance mail, honoring the job's `mail` policy.
pub fn finished_mail(
    def: &JobDef,
    instance_id: &str,
    exit: &ExitDisposition,
    output: &str,
) -> Option<MailMessage> {
    let send = match def.mail {
        MailPolicy::Never => false,
        MailPolicy::Always => true,
        MailPolicy::Error => !exit.is_success(),
        MailPolicy::Output => !output.is_empty(),
    };
    if !send {
        return None;
    }

    let status_line = match exit {
        ExitDisposition::Exited(0) => format!("Job {instance_id} finished."),
        ExitDisposition::Exited(code) => {
            format!("Job {instance_id} exited with error code {code}.")
        }
        ExitDisposition::Signaled(sig) => format!("Job {instance_id} died on signal {sig}."),
        ExitDisposition::Killed => format!("Job {instance_id} was killed."),
        ExitDisposition::Failed(reason) => {
            format!("Job {instance_id} could not be started: {reason}.")
        }
        ExitDisposition::Unknown => {
            format!("Job {instance_id} ended with unknown status.")
        }
    };

    let mut body = status_line;
    if !output.is_empty() {
        body.push_str("\n\n");
        body.push_str(output);
    }

    Some(MailMessage {
        sendmail: def.sendmail.clone(),
        mailto: def.mailto.clone(),
        from: def.username.clone(),
        subject: subject(def, instance_id, &exit.outcome()),
        body,
    })
}

/// Compose a conflict notice, honoring `warn` and the `mail` policy.
pub fn conflict_mail(
    def: &JobDef,
    instance_id: &str,
    notice: ConflictNotice,
) -> Option<MailMessage> {
    if !def.warn || def.mail == MailPolicy::Never {
        return None;
    }

    let (outcome, body) = match notice {
        ConflictNotice::SkipWaiting => (
            "conflict (skip)",
            format!(
                "The scheduled run for job {instance_id} was skipped because another\n\
                 instance of the job is already waiting to start."
            ),
        ),
        ConflictNotice::KillRunning => (
            "conflict (kill)",
            format!("Running job {instance_id} was killed in favor of a new instance."),
        ),
        ConflictNotice::IgnoreContention => (
            "conflict (ignore)",
            format!(
                "A new instance of job {instance_id} was enqueued although another\n\
                 instance is still active."
            ),
        ),
    };

    Some(MailMessage {
        sendmail: def.sendmail.clone(),
        mailto: def.mailto.clone(),
        from: def.username.clone(),
        subject: subject(def, instance_id, outcome),
        body,
    })
}

fn subject(def: &JobDef, instance_id: &str, outcome: &str) -> String {
    format!("{}@{}: {} {}", def.username, def.hostname, instance_id, outcome)
}

/// Delivers by piping the message into the job's sendmail program.
pub struct SendmailMailer<C: Clock> {
    log: Logger<C>,
}

impl<C: Clock> SendmailMailer<C> {
    pub fn new(log: Logger<C>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl<C: Clock> Mailer for SendmailMailer<C> {
    async fn deliver(&self, message: MailMessage) {
        self.log.debug("mail", &format!("send mail to {}", message.mailto));

        // `{}` in the sendmail setting is replaced by the recipient,
        // otherwise the recipient is appended.
        let command = if message.sendmail.contains("{}") {
            message.sendmail.replace("{}", &message.mailto)
        } else {
            format!("{} {}", message.sendmail, message.mailto)
        };

        let spawned = tokio::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.log.error("mail", &format!("{command:?} failed: {e}"));
                return;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            if let Err(e) = stdin.write_all(message.to_text().as_bytes()).await {
                self.log.error("mail", &format!("{command:?} failed: {e}"));
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                self.log
                    .error("mail", &format!("{command:?} failed with exit code {status}"));
            }
            Ok(_) => {}
            Err(e) => self.log.error("mail", &format!("{command:?} failed: {e}")),
        }
    }
}

#[cfg(test)]
#[path = "mailer_tests.rs"]
mod tests;
