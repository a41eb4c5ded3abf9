// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout Service (C4): per-command deadline timers independent of the
//! worker.
//!
//! Grounded on the teacher's `scheduler.rs` `HashMap<id, Timer>` bookkeeping
//! shape, but adapted from that module's poll-based "ask me what fired"
//! model to the callback-based `arm(id, duration, onFire)` semantics
//! spec.md §4.4 requires. Each armed timer is a `tokio::spawn`'d task
//! racing `tokio::time::sleep` against a `CancellationToken`, which is the
//! same race the driver uses for cooperative command cancellation.

use dbgx_core::CommandId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Timer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Maintains one deadline timer per command id (C4).
#[derive(Clone)]
pub struct TimeoutService {
    timers: Arc<Mutex<HashMap<CommandId, Timer>>>,
}

impl Default for TimeoutService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutService {
    pub fn new() -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedules `on_fire` to run after `duration`. If a timer for `id`
    /// already exists, it is replaced (the old one is cancelled first, so
    /// it never fires).
    pub fn arm<F>(&self, id: CommandId, duration: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(&id);

        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let timers = self.timers.clone();
        let id_for_task = id.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    on_fire.await;
                    timers.lock().remove(&id_for_task);
                }
                _ = cancel_for_task.cancelled() => {}
            }
        });

        self.timers.lock().insert(id, Timer { cancel, handle });
    }

    /// Cancels the timer for `id`. Idempotent: cancelling an id with no
    /// armed timer is a no-op. Guarantees `on_fire` does not run if this
    /// wins the race against the deadline.
    pub fn cancel(&self, id: &CommandId) {
        if let Some(timer) = self.timers.lock().remove(id) {
            timer.cancel.cancel();
            timer.handle.abort();
        }
    }

    pub fn is_armed(&self, id: &CommandId) -> bool {
        self.timers.lock().contains_key(id)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.lock().len()
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
