// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification Bus publisher (C8): the engine-side half of the bus.
//!
//! `dbgx-driver::notify` defines the [`NotifyAdapter`] trait and wire
//! events; this module is the only thing in the engine that calls it,
//! firing every event on its own spawned task so a slow or failing
//! subscriber never stalls the worker that raised it.

use dbgx_core::{CommandId, CommandState, SessionId};
use dbgx_driver::{NotifyAdapter, NotifyEvent};
use std::time::Duration;

/// Binds a [`NotifyAdapter`] to one session for convenient call sites.
#[derive(Clone)]
pub struct Notifier<N> {
    session_id: SessionId,
    adapter: N,
}

impl<N: NotifyAdapter> Notifier<N> {
    pub fn new(session_id: SessionId, adapter: N) -> Self {
        Self {
            session_id,
            adapter,
        }
    }

    /// Publishes a command state change (`queued`, `executing`, `completed`,
    /// `failed`, `cancelled`).
    #[allow(clippy::too_many_arguments)]
    pub fn command_status(
        &self,
        command_id: CommandId,
        command: &str,
        state: CommandState,
        progress: u8,
        message: impl Into<String>,
        result: Option<String>,
        error: Option<String>,
    ) {
        self.fire(NotifyEvent::CommandStatus {
            session_id: self.session_id.clone(),
            command_id,
            command: command.to_string(),
            status: state.to_string(),
            progress,
            message: message.into(),
            result,
            error,
        });
    }

    pub fn heartbeat(&self, command_id: CommandId, elapsed: Duration) {
        self.fire(NotifyEvent::CommandHeartbeat {
            session_id: self.session_id.clone(),
            command_id,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    /// Publishes an extension job state change (C9).
    pub fn extension_status(
        &self,
        job_id: impl Into<String>,
        extension_name: &str,
        status: impl Into<String>,
        message: Option<String>,
    ) {
        self.fire(NotifyEvent::ExtensionStatus {
            session_id: self.session_id.clone(),
            job_id: job_id.into(),
            extension_name: extension_name.to_string(),
            status: status.into(),
            message,
        });
    }

    pub fn health(
        &self,
        status: impl Into<String>,
        driver_active: bool,
        queue_size: usize,
        active_commands: usize,
    ) {
        self.fire(NotifyEvent::ServerHealth {
            status: status.into(),
            driver_active,
            queue_size,
            active_commands,
        });
    }

    fn fire(&self, event: NotifyEvent) {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            if let Err(err) = adapter.notify(event).await {
                tracing::warn!(error = %err, "notification delivery failed");
            }
        });
    }
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
