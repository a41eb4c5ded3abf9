// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error kinds surfaced across the tool contract (see crate docs).
//!
//! These are kinds, not exceptions: every terminal failure in the engine is
//! represented as one of these values and carried through the tracker,
//! cache, and notification bus rather than thrown across a component
//! boundary.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Maximum concurrent sessions exceeded: {current}/{max}")]
    SessionLimitExceeded { current: usize, max: usize },

    #[error("queue is not ready yet")]
    QueueNotReady,

    #[error("failed to start debugger: {0}")]
    DriverStartFailed(String),

    #[error("debugger process crashed: {0}")]
    ChildCrashed(String),

    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("extension not found: {0}")]
    ExtensionNotFound(String),

    #[error("extension subsystem is disabled")]
    ExtensionSubsystemDisabled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Dump file does not exist, per the `open-session` contract (S5).
    pub fn dump_file_missing(path: &str) -> Self {
        ErrorKind::InvalidInput(format!("Dump file does not exist: {path}"))
    }

    /// The stable machine-readable tag used in tool responses (`error.kind`).
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput(_) => "InvalidInput",
            ErrorKind::SessionNotFound(_) => "SessionNotFound",
            ErrorKind::CommandNotFound(_) => "CommandNotFound",
            ErrorKind::SessionLimitExceeded { .. } => "SessionLimitExceeded",
            ErrorKind::QueueNotReady => "QueueNotReady",
            ErrorKind::DriverStartFailed(_) => "DriverStartFailed",
            ErrorKind::ChildCrashed(_) => "ChildCrashed",
            ErrorKind::Timeout(_) => "Timeout",
            ErrorKind::Cancelled(_) => "Cancelled",
            ErrorKind::ExtensionNotFound(_) => "ExtensionNotFound",
            ErrorKind::ExtensionSubsystemDisabled => "ExtensionSubsystemDisabled",
            ErrorKind::Internal(_) => "Internal",
        }
    }

    /// Whether a caller is expected to retry (today, only `QueueNotReady`).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::QueueNotReady)
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
