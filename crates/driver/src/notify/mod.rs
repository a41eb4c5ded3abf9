// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters (C8): fire-and-forget delivery of queue/command/
//! session/health events to the external protocol layer.
//!
//! Delivery failures are logged at warning level and swallowed; no
//! back-pressure is ever propagated to the worker that emitted the event.

mod channel;
mod noop;

pub use channel::ChannelNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifyAdapter;

use async_trait::async_trait;
use dbgx_core::{CommandId, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// One event published by the notification bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotifyEvent {
    CommandStatus {
        session_id: SessionId,
        command_id: CommandId,
        command: String,
        status: String,
        progress: u8,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    CommandHeartbeat {
        session_id: SessionId,
        command_id: CommandId,
        elapsed_ms: u64,
    },
    ServerHealth {
        status: String,
        driver_active: bool,
        queue_size: usize,
        active_commands: usize,
    },
    ExtensionStatus {
        session_id: SessionId,
        job_id: String,
        extension_name: String,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Adapter for publishing bus events to whatever external layer is
/// listening (MCP client, log sink, test harness).
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    async fn notify(&self, event: NotifyEvent) -> Result<(), NotifyError>;
}
