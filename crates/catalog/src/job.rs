// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fully-resolved job definitions.

use crate::error::CatalogError;
use pcron_core::{IntervalSpec, TimeSpec};
use std::collections::BTreeMap;

pub const DEFAULT_SENDMAIL: &str = "/usr/lib/sendmail";

/// What to do when a new instance of a job would be enqueued while another
/// instance of the same job already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conflict {
    /// Append anyway; just note the contention in the log.
    #[default]
    Ignore,
    /// Drop the new instance if one is already waiting.
    Skip,
    /// Terminate the running instance and supersede any waiting ones.
    Kill,
}

pcron_core::simple_display! {
    Conflict {
        Ignore => "ignore",
        Skip => "skip",
        Kill => "kill",
    }
}

/// When to send the result mail for a finished instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailPolicy {
    Never,
    Always,
    /// Only when the instance did not exit cleanly.
    #[default]
    Error,
    /// Only when the instance produced output.
    Output,
}

pcron_core::simple_display! {
    MailPolicy {
        Never => "never",
        Always => "always",
        Error => "error",
        Output => "output",
    }
}

/// A single job from the catalog, immutable after a reload.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDef {
    pub name: String,
    pub command: String,
    pub active: bool,
    pub time: Option<TimeSpec>,
    pub interval: Option<IntervalSpec>,
    pub post: Vec<String>,
    pub condition: Option<String>,
    pub queue: String,
    pub conflict: Conflict,
    pub warn: bool,
    pub mail: MailPolicy,
    pub mailto: String,
    pub username: String,
    pub hostname: String,
    pub sendmail: String,
}

impl JobDef {
    /// Whether the job belongs in the scheduled set.
    pub fn is_scheduled(&self) -> bool {
        self.time.is_some() || self.interval.is_some() || !self.post.is_empty()
    }
}

/// Job names are dotted words: `\w+(-\w+|.\w+)*`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    !name.is_empty()
        && name
            .split('.')
            .all(|segment| !segment.is_empty() && segment.split('-').all(word))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "t" | "y" | "1" => Some(true),
        "false" | "no" | "f" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Build a [`JobDef`] from a section's effective (inheritance-resolved)
/// entries. Values map to `(text, source line)`.
pub(crate) fn from_overlay(
    name: &str,
    section_line: usize,
    entries: &BTreeMap<String, (String, usize)>,
    username: &str,
    hostname: &str,
) -> Result<JobDef, CatalogError> {
    let text = |key: &str| entries.get(key).map(|(v, _)| v.as_str());
    let line = |key: &str| entries.get(key).map(|&(_, l)| l).unwrap_or(section_line);

    let mut def = JobDef {
        name: name.to_string(),
        command: String::new(),
        active: true,
        time: None,
        interval: None,
        post: Vec::new(),
        condition: None,
        queue: name.to_string(),
        conflict: Conflict::Ignore,
        warn: true,
        mail: MailPolicy::Error,
        mailto: username.to_string(),
        username: username.to_string(),
        hostname: hostname.to_string(),
        sendmail: DEFAULT_SENDMAIL.to_string(),
    };
    let mut reboot = false;

    for (key, (value, value_line)) in entries {
        let bad = |message: String| CatalogError::invalid(name, *value_line, message);
        match key.as_str() {
            "command" => def.command = value.clone(),
            "condition" => def.condition = Some(value.clone()),
            "active" => {
                def.active = parse_bool(value)
                    .ok_or_else(|| bad(format!("invalid boolean value {value:?}")))?;
            }
            "warn" => {
                def.warn = parse_bool(value)
                    .ok_or_else(|| bad(format!("invalid boolean value {value:?}")))?;
            }
            "time" => {
                if value == "@reboot" {
                    reboot = true;
                } else {
                    def.time =
                        Some(TimeSpec::parse(value).map_err(|e| bad(e.to_string()))?);
                }
            }
            "interval" => {
                def.interval =
                    Some(IntervalSpec::parse(value).map_err(|e| bad(e.to_string()))?);
            }
            "post" => def.post = value.split_whitespace().map(str::to_string).collect(),
            "queue" => {
                if !is_valid_name(value) {
                    return Err(bad(format!("invalid queue name {value:?}")));
                }
                def.queue = value.clone();
            }
            "conflict" => {
                def.conflict = match value.as_str() {
                    "ignore" => Conflict::Ignore,
                    "skip" => Conflict::Skip,
                    "kill" => Conflict::Kill,
                    other => return Err(bad(format!("invalid conflict value {other:?}"))),
                };
            }
            "mail" => {
                def.mail = match value.as_str() {
                    "never" => MailPolicy::Never,
                    "always" => MailPolicy::Always,
                    "error" => MailPolicy::Error,
                    "output" => MailPolicy::Output,
                    other => return Err(bad(format!("invalid mail value {other:?}"))),
                };
            }
            "mailto" => def.mailto = value.clone(),
            "username" => def.username = value.clone(),
            "hostname" => def.hostname = value.clone(),
            "sendmail" => def.sendmail = value.clone(),
            other => {
                return Err(bad(format!("variable {other:?} not allowed")));
            }
        }
    }

    if def.command.is_empty() {
        return Err(CatalogError::invalid(name, line("command"), "variable 'command' is required"));
    }
    if reboot {
        // @reboot jobs are startup jobs; any other schedule source is
        // ignored alongside it.
        def.time = None;
        def.interval = None;
        def.post = Vec::new();
    }
    if def.post.contains(&def.name) {
        return Err(CatalogError::invalid(name, line("post"), "job cannot post after itself"));
    }

    Ok(def)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
