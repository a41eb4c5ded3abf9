// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command identifier and state machine.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};

/// Unique identifier for a command enqueued against a session.
///
/// Format: `cmd-<session-id>-<4-hex-seq>`. The session-id segment is
/// parseable back out, so a bare command id is enough to route a lookup
/// to the owning session without an extra index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(session_id: &SessionId, seq: u16) -> Self {
        Self(format!("cmd-{}-{:04x}", session_id.as_str(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a command id, validating shape and extracting the session id.
    pub fn parse(s: &str) -> Option<(Self, SessionId)> {
        let rest = s.strip_prefix("cmd-")?;
        let (session_part, seq) = rest.rsplit_once('-')?;
        if seq.len() != 4 || !seq.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return None;
        }
        let session_id = SessionId::parse(session_part)?;
        Some((Self(s.to_string()), session_id))
    }

    /// The session-id segment, without re-validating the full id.
    pub fn session_id(&self) -> Option<SessionId> {
        Self::parse(&self.0).map(|(_, sid)| sid)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for CommandId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Per-session sequence generator for [`CommandId`]s. Wraps at `0xffff`
/// (the id format budgets 4 hex digits); wrapping is harmless because ids
/// only need to be unique for the lifetime of their session, which is far
/// shorter than 65536 commands in realistic use.
#[derive(Default)]
pub struct CommandIdGen {
    counter: AtomicU16,
}

impl CommandIdGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU16::new(0),
        }
    }

    pub fn next(&self, session_id: &SessionId) -> CommandId {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        CommandId::new(session_id, seq)
    }
}

/// State of a command along its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    Queued,
    Executing,
    Completed,
    Cancelled,
    Failed,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandState::Completed | CommandState::Cancelled | CommandState::Failed
        )
    }

    /// Whether `self -> next` is a legal state transition.
    ///
    /// Transitions are monotonic: Queued -> Executing -> one terminal state.
    /// A Queued command may also go straight to Cancelled (removed from the
    /// FIFO before it ever started).
    pub fn can_transition_to(self, next: CommandState) -> bool {
        use CommandState::*;
        matches!(
            (self, next),
            (Queued, Executing)
                | (Queued, Cancelled)
                | (Executing, Completed)
                | (Executing, Failed)
                | (Executing, Cancelled)
        )
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandState::Queued => "queued",
            CommandState::Executing => "executing",
            CommandState::Completed => "completed",
            CommandState::Cancelled => "cancelled",
            CommandState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
