// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle and diagnostic logging for the CLI client.

use std::path::PathBuf;

use crate::client::{timeout_exit, ClientError};
use crate::daemon_process::{
    daemon_socket, force_kill_daemon, process_exists, read_daemon_pid, wait_for_exit,
};

/// Stop the daemon (SIGTERM first, then SIGKILL if it doesn't exit in time).
///
/// Returns `true` if a daemon was found and stopped, `false` if it wasn't
/// running. `dbgxd` itself closes every open session on SIGTERM before
/// exiting (main.rs), so there is no separate IPC shutdown request — the
/// signal alone is enough to drain in-flight commands as failed.
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let Some(pid) = read_daemon_pid()? else {
        return Ok(false);
    };

    if !process_exists(pid) {
        return Ok(false);
    }

    kill(pid, "-15");
    wait_for_exit(pid, timeout_exit()).await;

    if process_exists(pid) {
        force_kill_daemon(pid);
        wait_for_exit(pid, timeout_exit()).await;
    }

    Ok(true)
}

fn kill(pid: u32, signal: &str) -> bool {
    std::process::Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Write a diagnostic message to `<state_dir>/cli.log`.
fn write_cli_log(message: String) {
    use std::io::Write;
    use std::time::SystemTime;

    let log_path = daemon_socket()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("cli.log")))
        .unwrap_or_else(|| PathBuf::from("/tmp/dbgx-cli.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let pid = std::process::id();
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "(unknown)".to_string());
        let state_dir =
            std::env::var("DBGX_STATE_DIR").unwrap_or_else(|_| "(not set)".to_string());

        let _ = writeln!(
            file,
            "[ts={timestamp}] pid={pid} cwd={cwd} DBGX_STATE_DIR={state_dir} {message}"
        );
    }
}

/// Log a connection error for debugging.
///
/// Writes diagnostic info to `<state_dir>/cli.log` when the CLI fails to
/// connect to the daemon. Helps debug issues in callers where stdout/stderr
/// may not be visible (agent harnesses invoking `dbgx` as a subprocess).
pub fn log_connection_error(error: &ClientError) {
    let socket_path = daemon_socket()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    write_cli_log(format!("socket={socket_path} error={error}"));
}
