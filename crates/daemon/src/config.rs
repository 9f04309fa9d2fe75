// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration directory layout.

use crate::lifecycle::LifecycleError;
use pcron_engine::{CRONTAB_NAME, ENVIRONMENT_NAME, LOGFILE_NAME, PID_NAME, STATE_NAME};
use std::path::{Path, PathBuf};

/// All paths derive from one per-account configuration directory:
/// `crontab.ini`, `environment.sh`, `logfile.txt`, the pid file, the state
/// file, and the per-job working directories under `jobs/`.
#[derive(Debug, Clone)]
pub struct Config {
    pub dir: PathBuf,
}

impl Config {
    /// Resolve the configuration directory: an explicit `--dir`, else
    /// `$PCRONDIR`, else `~/.pcron`.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let dir = match dir {
            Some(dir) => dir,
            None => match std::env::var_os("PCRONDIR") {
                Some(dir) => PathBuf::from(dir),
                None => std::env::var_os("HOME")
                    .map(|home| Path::new(&home).join(".pcron"))
                    .ok_or(LifecycleError::NoConfigDir)?,
            },
        };
        Ok(Self { dir })
    }

    pub fn crontab_path(&self) -> PathBuf {
        self.dir.join(CRONTAB_NAME)
    }

    pub fn environ_path(&self) -> PathBuf {
        self.dir.join(ENVIRONMENT_NAME)
    }

    pub fn logfile_path(&self) -> PathBuf {
        self.dir.join(LOGFILE_NAME)
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_NAME)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_NAME)
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.dir.join("jobs")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
