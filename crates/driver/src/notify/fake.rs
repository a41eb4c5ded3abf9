// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError, NotifyEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

struct FakeNotifyState {
    events: Vec<NotifyEvent>,
}

/// Fake notification adapter for testing
#[derive(Clone)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl Default for FakeNotifyAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeNotifyState { events: Vec::new() })),
        }
    }
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events, in delivery order.
    pub fn events(&self) -> Vec<NotifyEvent> {
        self.inner.lock().events.clone()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, event: NotifyEvent) -> Result<(), NotifyError> {
        self.inner.lock().events.push(event);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
