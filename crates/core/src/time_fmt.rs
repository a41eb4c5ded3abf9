// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared human-readable duration formatting.

use std::time::Duration;

/// Format seconds as a short human-readable duration: `"5s"`, `"2m"`, `"1h30m"`, `"3d"`.
///
/// For the hours range, minutes are included when non-zero (e.g. `"1h"` vs `"1h5m"`).
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        if m > 0 {
            format!("{}h{}m", h, m)
        } else {
            format!("{}h", h)
        }
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Format milliseconds as a short human-readable duration.
///
/// Convenience wrapper around [`format_elapsed`].
pub fn format_elapsed_ms(ms: u64) -> String {
    format_elapsed(ms / 1000)
}

/// Format a command's execution time for the `read-command-result` contract.
///
/// Under a minute: seconds with an optional one-decimal fraction (`"4.2s"`,
/// `"12s"`). A minute or more: whole minutes, plus seconds only when
/// non-zero (`"2m"`, `"2m 5s"`). Matches `\d+(\.\d)?s` / `\d+m( \d+s)?`.
pub fn format_execution_time(duration: Duration) -> String {
    let total_ms = duration.as_millis() as u64;
    if total_ms < 60_000 {
        let tenths = total_ms / 100;
        let whole = tenths / 10;
        let frac = tenths % 10;
        if frac == 0 {
            format!("{}s", whole)
        } else {
            format!("{}.{}s", whole, frac)
        }
    } else {
        let total_secs = total_ms / 1000;
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs == 0 {
            format!("{}m", mins)
        } else {
            format!("{}m {}s", mins, secs)
        }
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
