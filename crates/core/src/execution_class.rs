// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-class timeout table.
//!
//! Every command gets a default timeout derived from its text prefix,
//! matched case-insensitively, first match wins. This is the table the
//! worker loop consults when it arms the timeout service for a newly
//! dequeued command.

use std::time::Duration;

const TEN_MINUTES: Duration = Duration::from_secs(10 * 60);
const TWO_MINUTES: Duration = Duration::from_secs(2 * 60);

/// Ordered prefix table; earlier rows take priority over later ones.
const CLASSES: &[(&str, Duration)] = &[
    ("!analyze", TEN_MINUTES),
    ("!heap", TEN_MINUTES),
    ("!dump", TEN_MINUTES),
    ("!gchandles", TEN_MINUTES),
    ("!threads", TWO_MINUTES),
    ("!k", TWO_MINUTES),
    ("k", TWO_MINUTES),
    ("lm", TWO_MINUTES),
    ("!peb", TWO_MINUTES),
];

/// Default timeout for anything not matching a known prefix.
pub const DEFAULT_TIMEOUT: Duration = TWO_MINUTES;

/// Resolve the default timeout for a raw command string.
///
/// Matching is case-insensitive and considers only the command's own text,
/// not surrounding whitespace — callers should trim first.
pub fn timeout_for(command: &str) -> Duration {
    let lower = command.to_ascii_lowercase();
    for (prefix, timeout) in CLASSES {
        if lower.starts_with(prefix) {
            return *timeout;
        }
    }
    DEFAULT_TIMEOUT
}

#[cfg(test)]
#[path = "execution_class_tests.rs"]
mod tests;
