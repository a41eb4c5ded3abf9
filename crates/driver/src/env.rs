// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the driver crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Per-line idle read timeout while a command is executing, reset on every
/// line received from the child (default: 120_000ms).
pub fn command_idle_timeout() -> Duration {
    parse_duration_ms("DBGX_COMMAND_IDLE_TIMEOUT_MS").unwrap_or(Duration::from_secs(120))
}

/// How long `start` waits for the first prompt sentinel before failing
/// with `DriverStartFailed` (default: 30_000ms).
pub fn driver_ready_timeout() -> Duration {
    parse_duration_ms("DBGX_DRIVER_READY_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}

/// Grace period `dispose` waits after sending the quit command before
/// killing the process tree (default: 3_000ms).
pub fn dispose_grace_period() -> Duration {
    parse_duration_ms("DBGX_DISPOSE_GRACE_MS").unwrap_or(Duration::from_secs(3))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
