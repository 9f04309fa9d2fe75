// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process supervision.
//!
//! [`ShellSpawner`] writes the generated script, starts the login shell in
//! its own process group, and watches for the exit from a background task
//! that posts a [`Event::ChildExited`] back to the engine loop. Conditions
//! run through the same machinery but are awaited inline.

use async_trait::async_trait;
use pcron_core::{Clock, Event, ExitDisposition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported shell {0}")]
    UnsupportedShell(String),

    #[error("shell {0} is inaccessible")]
    InaccessibleShell(String),
}

/// Everything needed to start one instance's process.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub job: String,
    pub instance_id: String,
    pub queue: String,
    pub seq: u64,
    /// Shell source to execute.
    pub command: String,
    /// The user's `environment.sh` contents, prepended to the script.
    pub init_code: String,
    pub env: HashMap<String, String>,
    pub working_dir: PathBuf,
    pub shell: PathBuf,
}

/// Handle to a started child.
#[derive(Debug, Clone)]
pub struct ChildHandle {
    /// Process id (also the process group id). `None` for test doubles.
    pub pid: Option<i32>,
    /// Where stdout and stderr are captured.
    pub output_path: PathBuf,
}

#[async_trait]
pub trait Spawner: Send + Sync + 'static {
    /// Start the instance's command. The exit is reported asynchronously
    /// as a [`Event::ChildExited`] on the engine's event queue.
    async fn spawn(&self, req: SpawnRequest) -> Result<ChildHandle, SpawnError>;

    /// Run a condition command to completion and return its exit code.
    /// This suspends the caller; the engine accepts that by design.
    async fn run_condition(&self, req: SpawnRequest) -> Result<i32, SpawnError>;

    /// Ask a running child to terminate: SIGTERM to the process group now,
    /// SIGKILL after the grace period if it is still alive.
    async fn terminate(&self, handle: &ChildHandle) -> Result<(), SpawnError>;
}

/// The script wraps the user's environment file so that variables it sets
/// are exported, then runs the job command with normal semantics.
fn script_source(init_code: &str, command: &str) -> String {
    format!("set -ea\n{init_code}\nset +ea\n{command}\n")
}

/// Spawner backed by real processes under the account's login shell.
pub struct ShellSpawner<C: Clock> {
    clock: C,
    event_tx: mpsc::Sender<Event>,
    grace: Duration,
}

impl<C: Clock> ShellSpawner<C> {
    pub fn new(clock: C, event_tx: mpsc::Sender<Event>, grace: Duration) -> Self {
        Self { clock, event_tx, grace }
    }

    fn write_script(&self, req: &SpawnRequest, name: &str) -> Result<PathBuf, SpawnError> {
        std::fs::create_dir_all(&req.working_dir)?;
        let path = req.working_dir.join(name);
        std::fs::write(&path, script_source(&req.init_code, &req.command))?;
        Ok(path)
    }

    fn command(
        &self,
        req: &SpawnRequest,
        script: &Path,
        output: std::fs::File,
    ) -> Result<tokio::process::Command, SpawnError> {
        let stderr = output.try_clone()?;
        let mut cmd = tokio::process::Command::new(&req.shell);
        cmd.arg(script)
            .current_dir(&req.working_dir)
            .env_clear()
            .envs(&req.env)
            .stdin(std::process::Stdio::null())
            .stdout(output)
            .stderr(stderr)
            .process_group(0);
        Ok(cmd)
    }
}

#[async_trait]
impl<C: Clock> Spawner for ShellSpawner<C> {
    async fn spawn(&self, req: SpawnRequest) -> Result<ChildHandle, SpawnError> {
        let script = self.write_script(&req, "command.sh")?;
        let output_path = req.working_dir.join("output.txt");
        let output = std::fs::File::create(&output_path)?;

        let mut child = self.command(&req, &script, output)?.spawn()?;
        let pid = child.id().map(|p| p as i32);

        let clock = self.clock.clone();
        let event_tx = self.event_tx.clone();
        let SpawnRequest { job, queue, seq, .. } = req;
        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => classify_exit(status),
                Err(e) => ExitDisposition::Failed(e.to_string()),
            };
            let event = Event::ChildExited { queue, job, seq, exit, ended_at: clock.now() };
            if event_tx.send(event).await.is_err() {
                tracing::warn!("engine gone, dropping child exit event");
            }
        });

        Ok(ChildHandle { pid, output_path })
    }

    async fn run_condition(&self, req: SpawnRequest) -> Result<i32, SpawnError> {
        let script = self.write_script(&req, "condition.sh")?;
        let output_path = req.working_dir.join("condition.txt");
        let output = std::fs::File::create(&output_path)?;

        let status = self.command(&req, &script, output)?.status().await?;
        // Signal death counts as failure.
        Ok(status.code().unwrap_or(-1))
    }

    async fn terminate(&self, handle: &ChildHandle) -> Result<(), SpawnError> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pid) = handle.pid else {
            return Ok(());
        };
        let pgid = Pid::from_raw(pid);
        killpg(pgid, Signal::SIGTERM).map_err(std::io::Error::other)?;

        // Escalate after the grace period without blocking the engine.
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if nix::sys::signal::kill(pgid, None).is_ok() {
                let _ = killpg(pgid, Signal::SIGKILL);
            }
        });
        Ok(())
    }
}

fn classify_exit(status: std::process::ExitStatus) -> ExitDisposition {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => ExitDisposition::Exited(code),
        None => ExitDisposition::Signaled(status.signal().unwrap_or(0)),
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
