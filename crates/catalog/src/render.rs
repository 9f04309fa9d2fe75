// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog renderer.
//!
//! Writes a catalog back out as `crontab.ini` text. Every field is written
//! explicitly (inheritance is already resolved), so
//! `parse(render(catalog)) == catalog` for any legally authored catalog.

use crate::catalog::Catalog;
use crate::job::JobDef;
use std::fmt::Write;

pub fn render(catalog: &Catalog) -> String {
    let mut out = String::new();

    if catalog.loglevel != pcron_core::LogLevel::default() {
        let level = match catalog.loglevel {
            pcron_core::LogLevel::Debug => "debug",
            pcron_core::LogLevel::Info => "info",
            _ => "quiet",
        };
        let _ = writeln!(out, "[default]\nloglevel = {level}\n");
    }

    let all = catalog.jobs.iter().chain(catalog.startup.iter());
    for (name, def) in all {
        let _ = writeln!(out, "[{name}]");
        render_job(&mut out, def);
        out.push('\n');
    }

    out
}

fn render_job(out: &mut String, def: &JobDef) {
    write_value(out, "command", &def.command);
    let _ = writeln!(out, "active = {}", def.active);
    if let Some(ref time) = def.time {
        let _ = writeln!(out, "time = {time}");
    }
    if let Some(ref interval) = def.interval {
        let _ = writeln!(out, "interval = {interval}");
    }
    if !def.post.is_empty() {
        let _ = writeln!(out, "post = {}", def.post.join(" "));
    }
    if let Some(ref condition) = def.condition {
        write_value(out, "condition", condition);
    }
    let _ = writeln!(out, "queue = {}", def.queue);
    let _ = writeln!(out, "conflict = {}", def.conflict);
    let _ = writeln!(out, "warn = {}", def.warn);
    let _ = writeln!(out, "mail = {}", def.mail);
    let _ = writeln!(out, "mailto = {}", def.mailto);
    let _ = writeln!(out, "username = {}", def.username);
    let _ = writeln!(out, "hostname = {}", def.hostname);
    let _ = writeln!(out, "sendmail = {}", def.sendmail);
}

/// Write a key whose value may span lines; later lines become indented
/// continuations.
fn write_value(out: &mut String, key: &str, value: &str) {
    let mut lines = value.lines();
    let _ = writeln!(out, "{} = {}", key, lines.next().unwrap_or_default());
    for line in lines {
        let _ = writeln!(out, "    {line}");
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
