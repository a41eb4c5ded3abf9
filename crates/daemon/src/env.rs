// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Mirrors `dbgx-driver::env`'s "parse_duration_ms + named getters with
//! defaults" shape, but for the knobs the daemon binary itself resolves
//! (state directory, debugger path, session cap, idle timeout, sweep
//! intervals) rather than the per-command I/O timings the driver owns.

use std::path::PathBuf;
use std::time::Duration;

fn parse_duration_secs(var: &str) -> Option<Duration> {
    std::env::var(var).ok()?.parse::<u64>().ok().map(Duration::from_secs)
}

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok()?.parse::<u64>().ok().map(Duration::from_millis)
}

/// `DBGX_STATE_DIR` override for the daemon's runtime directory (socket,
/// pid lock, log file). Falls back to `dirs::state_dir()/dbgx`.
pub fn state_dir_override() -> Option<PathBuf> {
    std::env::var("DBGX_STATE_DIR").ok().map(PathBuf::from)
}

/// `DBGX_CDB_PATH` override for the debugger executable.
pub fn cdb_path_override() -> Option<PathBuf> {
    std::env::var("DBGX_CDB_PATH").ok().map(PathBuf::from)
}

/// `DBGX_MAX_SESSIONS` override for the session cap.
pub fn max_sessions_override() -> Option<usize> {
    std::env::var("DBGX_MAX_SESSIONS").ok()?.parse().ok()
}

/// `DBGX_IDLE_TIMEOUT_SECS` override for the idle-session sweep window.
pub fn idle_timeout_override() -> Option<Duration> {
    parse_duration_secs("DBGX_IDLE_TIMEOUT_SECS")
}

/// `DBGX_IDLE_SWEEP_MS` override for how often the idle sweep runs.
pub fn idle_sweep_interval() -> Duration {
    parse_duration_ms("DBGX_IDLE_SWEEP_MS").unwrap_or(Duration::from_secs(60))
}

/// `DBGX_HEALTH_SWEEP_MS` override for how often the health sweep runs.
pub fn health_sweep_interval() -> Duration {
    parse_duration_ms("DBGX_HEALTH_SWEEP_MS").unwrap_or(Duration::from_secs(15))
}

/// `DBGX_EXTENSIONS_ENABLED` override for whether `enqueue-extension` is
/// served at all (e.g. `0`/`false` to disable the subsystem).
pub fn extensions_enabled_override() -> Option<bool> {
    match std::env::var("DBGX_EXTENSIONS_ENABLED").ok()?.as_str() {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
