// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure progress/ETA/polling-hint math shared by the queue and the
//! `read-command-result` contract (spec.md §4.5).

use dbgx_core::CommandState;
use std::time::Duration;

/// `max(queueProgress + timeProgress, minByElapsed)`, clamped to `[0, 100]`.
pub fn compute_progress(queue_position: u32, elapsed: Duration) -> u8 {
    let queue_progress = (10i64 - queue_position as i64).clamp(0, 10) * 5;
    let minutes_elapsed = elapsed.as_secs_f64() / 60.0;
    let time_progress = (minutes_elapsed * 2.0).floor().clamp(0.0, 50.0) as i64;
    let seconds_elapsed = elapsed.as_secs_f64();
    let min_by_elapsed = (seconds_elapsed * 0.5).floor().clamp(0.0, 95.0) as i64;

    (queue_progress + time_progress).max(min_by_elapsed).clamp(0, 100) as u8
}

/// `remaining = max(0, max(2min, classTimeout) - elapsed)` for the
/// executing command, plus the sum of class timeouts for commands ahead in
/// FIFO.
pub fn compute_eta(
    class_timeout: Duration,
    elapsed: Duration,
    ahead_timeouts: impl IntoIterator<Item = Duration>,
) -> Duration {
    let floor = class_timeout.max(Duration::from_secs(120));
    let own_remaining = floor.saturating_sub(elapsed);
    ahead_timeouts
        .into_iter()
        .fold(own_remaining, |acc, t| acc + t)
}

/// Advisory polling-interval hint for a status response.
pub fn polling_hint(state: CommandState, queue_position: u32) -> &'static str {
    if state.is_terminal() {
        return "no need to poll again";
    }
    if state == CommandState::Executing {
        return "1-3s";
    }
    match queue_position {
        0 => "1-3s",
        1 => "3-5s",
        2 => "5-8s",
        3 => "8-12s",
        4 => "12-15s",
        _ => "15-30s",
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
