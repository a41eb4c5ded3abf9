// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The debugger driver contract (C1).
//!
//! One driver owns exactly one child debugger process and executes one
//! command at a time against it: the child is a stateful REPL, not a pool
//! of independent invocations.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("failed to start debugger: {0}")]
    StartFailed(String),
    #[error("debugger process crashed: {0}")]
    ChildCrashed(String),
    #[error("cancelled")]
    Cancelled,
    #[error("no output received within the idle window")]
    Timeout,
}

/// Owns one child debugger process for the lifetime of a session.
#[async_trait]
pub trait DebuggerAdapter: Clone + Send + Sync + 'static {
    /// Launch the child, load the dump (and symbols, if given), set the
    /// prompt sentinel, and return only once the sentinel has been
    /// observed on stdout.
    async fn start(
        &self,
        dump_path: &Path,
        symbols_path: Option<&Path>,
    ) -> Result<(), DriverError>;

    /// Write `command_text` to the child and read merged stdout/stderr
    /// until the sentinel recurs at the start of a line. Stderr lines are
    /// prefixed `[STDERR]` in the returned text.
    async fn execute(
        &self,
        command_text: &str,
        cancellation: CancellationToken,
    ) -> Result<String, DriverError>;

    /// True iff the child is running and the last health probe succeeded.
    async fn is_active(&self) -> bool;

    /// Ask the child to quit, wait a short grace period, then kill the
    /// process tree if it has not exited.
    async fn dispose(&self);
}
