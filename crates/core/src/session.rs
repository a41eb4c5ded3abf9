// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and status.
//!
//! A session binds one dump file to one child debugger process. The
//! identifier format is bit-exact (`sess-\d{6}-[0-9a-f]{8}`) so that it can
//! be embedded, unambiguously, as the first segment of a [`crate::command::CommandId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique, process-local identifier for a debugging session.
///
/// Format: `sess-<6-digit-seq>-<8-hex>`. The sequence makes ids easy to
/// read in logs in creation order; the hex suffix keeps them unguessable
/// and guarantees uniqueness across a restarted sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Parse a session id from its wire string form, validating the shape.
    pub fn parse(s: &str) -> Option<Self> {
        if is_valid_session_id(s) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn is_valid_session_id(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("sess-") else {
        return false;
    };
    let mut parts = rest.splitn(2, '-');
    let Some(seq) = parts.next() else {
        return false;
    };
    let Some(hex) = parts.next() else {
        return false;
    };
    seq.len() == 6
        && seq.chars().all(|c| c.is_ascii_digit())
        && hex.len() == 8
        && hex
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

/// Generates session ids with a monotonically increasing sequence number.
///
/// The hex suffix is sourced from a process-wide random generator so two
/// generators (e.g. across restarts) never collide even if the sequence
/// counter restarts at zero.
#[derive(Default)]
pub struct SessionIdGen {
    counter: AtomicU32,
}

impl SessionIdGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> SessionId {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let hex = format!("{:08x}", uuid::Uuid::new_v4().as_u128() as u32);
        SessionId(format!("sess-{:06}-{}", seq % 1_000_000, hex))
    }
}

/// Lifecycle status of a [`SessionId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Driver is starting; not yet accepting commands.
    Initializing,
    /// Ready: driver is up, queue worker is running.
    Active,
    /// Driver crashed or became unresponsive; recovery is in progress.
    Recovering,
    /// `close` has been requested; draining in-flight commands.
    Disposing,
    /// Fully torn down; no longer looked up by the session manager.
    Disposed,
    /// Recovery exhausted its retries; session is unusable until closed.
    Error,
}

impl SessionStatus {
    /// Sessions in these states no longer accept new commands.
    pub fn accepts_commands(self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Disposed | SessionStatus::Error)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::Active => "active",
            SessionStatus::Recovering => "recovering",
            SessionStatus::Disposing => "disposing",
            SessionStatus::Disposed => "disposed",
            SessionStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
