// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Functions for starting, stopping, and monitoring the `dbgxd` process.

use crate::client::ClientError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use dbgx_daemon::Config;

/// Start the daemon in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let dbgxd_path = find_dbgxd_binary()?;

    Command::new(&dbgxd_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Wait for a process to exit.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(super::client::poll_interval()).await;
    }
    false
}

/// Find the `dbgxd` binary.
fn find_dbgxd_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = crate::env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().ok();

    // Only use CARGO_MANIFEST_DIR if the CLI itself is a debug build, so a
    // release dbgx doesn't accidentally pick up a stale dev dbgxd.
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
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

fn config() -> Result<Config, ClientError> {
    Config::load().map_err(|_| ClientError::NoStateDir)
}

/// Get the socket path for the daemon.
pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(config()?.socket_path)
}

pub fn daemon_log_path() -> Result<PathBuf, ClientError> {
    Ok(config()?.log_path)
}

/// Get the PID of a running daemon from its lock file, if any.
///
/// `dbgxd` writes its own PID into `lock_path` once it holds the exclusive
/// lock, so the file doubles as both lock and PID file.
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let lock_path = config()?.lock_path;

    if !lock_path.exists() {
        return Ok(None);
    }

    match std::fs::read_to_string(&lock_path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

/// Execute `kill` with the given signal and PID.
fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check if a process with the given PID exists.
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Force kill a daemon process.
pub fn force_kill_daemon(pid: u32) -> bool {
    kill_signal("-9", pid)
}

/// Startup marker prefix that the daemon writes to its log before anything else.
const STARTUP_MARKER_PREFIX: &str = "--- dbgxd: starting (pid: ";

/// Read the daemon log from the last startup marker, looking for errors.
pub fn read_startup_error() -> Option<String> {
    let log_path = daemon_log_path().ok()?;
    let content = std::fs::read_to_string(&log_path).ok()?;
    parse_startup_error(&content)
}

/// Parse startup errors from log content (pure logic, no I/O).
fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    if let Some(startup_error) = read_startup_error() {
        ClientError::DaemonStartFailed(startup_error)
    } else {
        err
    }
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove a stale socket file when the daemon is not running.
///
/// Called when the socket file exists but we can't connect to it — the
/// daemon likely crashed without cleaning up after itself.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let socket_path = daemon_socket()?;
    if socket_path.exists() && !probe_socket(&socket_path) {
        let _ = std::fs::remove_file(&socket_path);
    }
    Ok(())
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
