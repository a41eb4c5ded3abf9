// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbgx daemon` - daemon process management commands.

use crate::client::DaemonClient;
use crate::client_lifecycle::daemon_stop;
use crate::daemon_process::{daemon_log_path, daemon_socket, probe_socket, process_exists, read_daemon_pid};
use crate::output::{display_log, OutputFormat};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
    /// Stop and restart the daemon
    Restart,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show (default: 50)
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Show all lines (no limit)
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        /// Follow log output
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        Some(DaemonCommand::Start { foreground }) => start(foreground).await,
        Some(DaemonCommand::Stop) => stop().await,
        Some(DaemonCommand::Restart) => restart().await,
        Some(DaemonCommand::Status) => status(format).await,
        Some(DaemonCommand::Logs {
            limit,
            no_limit,
            follow,
        }) => logs(limit, no_limit, follow, format).await,
        None => {
            status(format).await
        }
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let dbgxd_path = find_dbgxd_binary()?;
        let status = Command::new(&dbgxd_path).status()?;
        if !status.success() {
            return Err(anyhow!("daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Some(pid) = read_daemon_pid()? {
        if process_exists(pid) {
            println!("daemon already running (pid {pid})");
            return Ok(());
        }
    }

    DaemonClient::for_action().map_err(|e| anyhow!("failed to start daemon: {e}"))?;
    println!("daemon started");
    Ok(())
}

async fn stop() -> Result<()> {
    match daemon_stop().await {
        Ok(true) => {
            println!("daemon stopped");
            Ok(())
        }
        Ok(false) => {
            println!("daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("failed to stop daemon: {e}")),
    }
}

async fn restart() -> Result<()> {
    let was_running = daemon_stop()
        .await
        .map_err(|e| anyhow!("failed to stop daemon: {e}"))?;

    if was_running {
        // Grace period for the OS to release the Unix socket.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    DaemonClient::for_action().map_err(|e| anyhow!("failed to start daemon: {e}"))?;
    println!("daemon restarted");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let pid = read_daemon_pid()?;
    let running = match pid {
        Some(pid) if process_exists(pid) => {
            let socket_path = daemon_socket()?;
            Some((pid, probe_socket(&socket_path)))
        }
        _ => None,
    };

    match format {
        OutputFormat::Text => match running {
            Some((pid, accepting)) => {
                println!("status: running (pid {pid})");
                if !accepting {
                    println!("warning: process is alive but the socket isn't accepting connections yet");
                }
            }
            None => println!("status: not running"),
        },
        OutputFormat::Json => {
            let obj = match running {
                Some((pid, accepting)) => serde_json::json!({
                    "status": "running",
                    "pid": pid,
                    "accepting_connections": accepting,
                }),
                None => serde_json::json!({ "status": "not_running" }),
            };
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }

    Ok(())
}

async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = daemon_log_path()?;

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("no log file found at {}", log_path.display()),
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "log_path": log_path.to_string_lossy(),
                    "lines": [],
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            }
        }
        return Ok(());
    }

    let content = if no_limit {
        std::fs::read_to_string(&log_path)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    display_log(&log_path, &content, follow, format, "daemon", "log").await
}

fn read_last_lines(path: &std::path::Path, n: usize) -> Result<String> {
    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

fn find_dbgxd_binary() -> Result<PathBuf> {
    let current_exe = std::env::current_exe().ok();

    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/dbgxd"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return Ok(path);
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("dbgxd");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    Ok(PathBuf::from("dbgxd"))
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
