// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: pid file, first catalog load, engine assembly.

use crate::config::Config;
use pcron_catalog::{Catalog, CatalogDefaults};
use pcron_core::{Event, LogLevel, SystemClock};
use pcron_engine::{
    Identity, Logger, Scheduler, SchedulerDeps, SendmailMailer, ShellSpawner, KILL_GRACE_SECONDS,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot determine a configuration directory (no --dir, $PCRONDIR or $HOME)")]
    NoConfigDir,

    #[error("pcron is already running as pid {0}")]
    AlreadyRunning(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot use crontab: {0}")]
    Catalog(#[from] pcron_catalog::CatalogError),

    #[error(transparent)]
    Engine(#[from] pcron_engine::EngineError),

    #[error("no such job: {0:?}")]
    NoSuchJob(String),
}

/// The pid file: one line, numeric pid. Created on start, removed on
/// clean exit; a live process at the recorded pid means the engine is
/// running.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(path: PathBuf) -> Result<Self, LifecycleError> {
        if let Some(pid) = read_pid(&path) {
            if nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok() {
                return Err(LifecycleError::AlreadyRunning(pid));
            }
            tracing::warn!(pid, "removing stale pid file");
        }
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(error = %e, "cannot remove pid file");
        }
    }
}

/// Read the pid recorded in a pid file, if it parses.
pub fn read_pid(path: &std::path::Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// The daemon's engine with its concrete adapter types.
pub type DaemonScheduler =
    Scheduler<SystemClock, ShellSpawner<SystemClock>, SendmailMailer<SystemClock>>;

pub struct StartupResult {
    pub scheduler: DaemonScheduler,
    pub event_rx: mpsc::Receiver<Event>,
    pub event_tx: mpsc::Sender<Event>,
    /// `None` for the one-shot entry point, which must not claim the
    /// daemon's pid file.
    pub pid_file: Option<PidFile>,
}

/// Assemble the engine over the configuration directory.
///
/// On first start an invalid catalog is fatal with a diagnostic; an empty
/// one is not, the engine just runs with no jobs.
pub fn startup(config: &Config, claim_pid: bool) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.dir)?;

    let pid_file =
        if claim_pid { Some(PidFile::create(config.pid_path())?) } else { None };

    let clock = SystemClock;
    let identity = Identity::current()?;
    let logger = Logger::to_file(clock.clone(), LogLevel::default(), &config.logfile_path())?;

    let defaults = CatalogDefaults {
        username: identity.username.clone(),
        hostname: identity.hostname.clone(),
    };
    let catalog = match pcron_catalog::parse_file(&config.crontab_path(), &defaults) {
        Ok(catalog) => catalog,
        Err(e) if e.is_empty() => {
            logger.warn("main", "crontab is empty");
            Catalog::default()
        }
        Err(e) => return Err(e.into()),
    };

    logger.set_level(catalog.loglevel);

    let (event_tx, event_rx) = mpsc::channel(256);
    let spawner = Arc::new(ShellSpawner::new(
        clock.clone(),
        event_tx.clone(),
        Duration::from_secs(KILL_GRACE_SECONDS),
    ));
    let mailer = Arc::new(SendmailMailer::new(logger.clone()));

    logger.info("main", &format!("started with pid {}", std::process::id()));

    let scheduler = Scheduler::new(
        SchedulerDeps {
            clock,
            spawner,
            mailer,
            logger,
            identity,
            dir: config.dir.clone(),
        },
        catalog,
    );

    Ok(StartupResult { scheduler, event_rx, event_tx, pid_file })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
