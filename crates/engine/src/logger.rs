// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operator logfile.
//!
//! Plain text, one record per line, timestamped from the injected clock and
//! tagged with a component name (`main`, `mail`, `state`, or an instance
//! id). This is the file operators read; `tracing` diagnostics in the
//! daemon crate are separate.

use parking_lot::Mutex;
use pcron_core::{Clock, LogLevel};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub struct Logger<C: Clock> {
    clock: C,
    level: Arc<Mutex<LogLevel>>,
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl<C: Clock> Clone for Logger<C> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            level: Arc::clone(&self.level),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<C: Clock> Logger<C> {
    pub fn new(clock: C, level: LogLevel, sink: Box<dyn Write + Send>) -> Self {
        Self { clock, level: Arc::new(Mutex::new(level)), sink: Arc::new(Mutex::new(sink)) }
    }

    /// Open (appending) the logfile at `path`.
    pub fn to_file(clock: C, level: LogLevel, path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(clock, level, Box::new(file)))
    }

    pub fn level(&self) -> LogLevel {
        *self.level.lock()
    }

    /// Reloads may change the catalog's `loglevel`.
    pub fn set_level(&self, level: LogLevel) {
        *self.level.lock() = level;
    }

    pub fn log(&self, level: LogLevel, component: &str, message: &str) {
        if level > self.level() {
            return;
        }
        let stamp = self.clock.now().format("%Y-%m-%d %H:%M:%S");
        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "{}  {:<7}  {:<12}  {}", stamp, level.label(), component, message);
        let _ = sink.flush();
    }

    pub fn error(&self, component: &str, message: &str) {
        self.log(LogLevel::Error, component, message);
    }

    pub fn warn(&self, component: &str, message: &str) {
        self.log(LogLevel::Warn, component, message);
    }

    pub fn info(&self, component: &str, message: &str) {
        self.log(LogLevel::Info, component, message);
    }

    pub fn debug(&self, component: &str, message: &str) {
        self.log(LogLevel::Debug, component, message);
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
