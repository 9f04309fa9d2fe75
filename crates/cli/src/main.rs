// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `pcron` binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pcron_daemon::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pcron", about = "A per-user periodic job scheduler", version)]
struct Cli {
    /// Configuration directory (default: $PCRONDIR or ~/.pcron).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduling engine in the foreground.
    Start,
    /// Run one job now and wait for it to finish.
    Run {
        /// Job id from the catalog (startup jobs included).
        job: String,
    },
    /// Ask a running engine to reload its catalog.
    Reload,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.dir)?;

    match cli.command {
        Command::Start => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(pcron_daemon::run(&config))?;
            Ok(())
        }
        Command::Run { job } => {
            let runtime = tokio::runtime::Runtime::new()?;
            let success = runtime.block_on(pcron_daemon::run_single(&config, &job))?;
            if success {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }
        Command::Reload => reload(&config),
    }
}

/// The signalling half of the external configuration-tool contract: read
/// the pid file and send SIGHUP.
fn reload(config: &Config) -> anyhow::Result<()> {
    let pid_path = config.pid_path();
    let pid = pcron_daemon::read_pid(&pid_path)
        .with_context(|| format!("no running engine ({} unreadable)", pid_path.display()))?;
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), nix::sys::signal::Signal::SIGHUP)
        .with_context(|| format!("cannot signal pid {pid}"))?;
    eprintln!("reload requested from pid {pid}");
    Ok(())
}
