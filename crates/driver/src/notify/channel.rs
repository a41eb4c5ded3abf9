// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel-backed notification adapter.
//!
//! Forwards every event onto an unbounded mpsc channel consumed by a host
//! task (the MCP layer, a log sink, whatever is on the other end). Never
//! blocks the worker: if the receiver has been dropped, the send failure is
//! surfaced to the caller, who logs and swallows it per the bus contract.

use super::{NotifyAdapter, NotifyError, NotifyEvent};
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct ChannelNotifyAdapter {
    tx: mpsc::UnboundedSender<NotifyEvent>,
}

impl ChannelNotifyAdapter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotifyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotifyAdapter for ChannelNotifyAdapter {
    async fn notify(&self, event: NotifyEvent) -> Result<(), NotifyError> {
        self.tx
            .send(event)
            .map_err(|e| NotifyError::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
