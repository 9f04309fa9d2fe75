// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account identity and child-process environment.

use crate::error::EngineError;
use crate::supervisor::SpawnError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Shells the generated job scripts are known to work under. The script
/// preamble relies on bourne semantics (`set -ea`).
pub const SUPPORTED_SHELLS: [&str; 5] = ["sh", "bash", "ksh", "zsh", "dash"];

const PATH_USER: &str = "/usr/local/bin:/usr/bin:/bin";
const PATH_ROOT: &str = "/usr/local/bin:/usr/bin:/bin:/usr/local/sbin:/usr/sbin:/sbin";

/// The account the engine runs as, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    pub shell: PathBuf,
    pub hostname: String,
}

impl Identity {
    /// Resolve the invoking account from the account database.
    pub fn current() -> Result<Self, EngineError> {
        let uid = nix::unistd::getuid();
        let user = nix::unistd::User::from_uid(uid)
            .map_err(|e| EngineError::Identity(e.to_string()))?
            .ok_or_else(|| EngineError::Identity(format!("uid {uid} has no passwd entry")))?;
        let hostname = nix::unistd::gethostname()
            .map_err(|e| EngineError::Identity(e.to_string()))?
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            username: user.name,
            uid: uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
            shell: user.shell,
            hostname,
        })
    }

    pub fn shell_name(&self) -> &str {
        self.shell.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }
}

/// Synthesize the environment for a job (or condition) process.
///
/// The shell must be bourne-compatible and executable; anything else is an
/// environment-setup failure and the instance never runs.
pub fn child_env(
    identity: &Identity,
    dir: &Path,
    job_id: &str,
    queue: &str,
) -> Result<HashMap<String, String>, SpawnError> {
    if !SUPPORTED_SHELLS.contains(&identity.shell_name()) {
        return Err(SpawnError::UnsupportedShell(identity.shell.display().to_string()));
    }
    if !is_executable(&identity.shell) {
        return Err(SpawnError::InaccessibleShell(identity.shell.display().to_string()));
    }

    let path = if identity.uid == 0 { PATH_ROOT } else { PATH_USER };
    Ok(HashMap::from([
        ("USER".to_string(), identity.username.clone()),
        ("LOGNAME".to_string(), identity.username.clone()),
        ("UID".to_string(), identity.uid.to_string()),
        ("GID".to_string(), identity.gid.to_string()),
        ("HOME".to_string(), identity.home.display().to_string()),
        ("SHELL".to_string(), identity.shell.display().to_string()),
        ("PATH".to_string(), path.to_string()),
        ("PCRONDIR".to_string(), dir.display().to_string()),
        ("JOB_ID".to_string(), job_id.to_string()),
        ("JOB_QUEUE".to_string(), queue.to_string()),
    ]))
}

fn is_executable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::X_OK).is_ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
