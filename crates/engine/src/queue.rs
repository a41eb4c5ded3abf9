// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolated Command Queue (C5): one dedicated worker per session.
//!
//! The worker owns no lock of its own; it pops from a FIFO guarded by a
//! [`parking_lot::Mutex`] and a [`tokio::sync::Notify`] used purely as a
//! wakeup signal (its permit semantics mean a wakeup delivered before
//! anyone is waiting is not lost). Cross-component calls proceed in the
//! fixed order spec.md §5 requires: Queue → Tracker → Cache → Notifications.

use crate::cache::ResultCache;
use crate::notifications::Notifier;
use crate::progress;
use crate::timeout::TimeoutService;
use crate::tracker::CommandTracker;
use dbgx_core::execution_class::timeout_for;
use dbgx_core::{Clock, CommandId, CommandResult, CommandState};
use dbgx_driver::{DebuggerAdapter, DriverError, NotifyAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Notify as WakeNotify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How often the worker emits a heartbeat notification for the command
/// currently executing (spec.md §4.5, "every N seconds").
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

struct PendingEntry {
    id: CommandId,
    text: String,
}

/// Per-command cancellation handle. `user_cancelled` disambiguates an
/// explicit `cancel()` from the Timeout Service firing the same token:
/// both end the driver's `execute` call with `DriverError::Cancelled`,
/// but the former is a `Cancelled` result and the latter is `Failed`.
#[derive(Clone)]
struct CancelHandle {
    token: CancellationToken,
    user_cancelled: Arc<AtomicBool>,
}

struct Shared<D, N, C> {
    driver: D,
    tracker: Arc<CommandTracker>,
    cache: Arc<ResultCache>,
    timeouts: TimeoutService,
    clock: C,
    notifier: Notifier<N>,
    pending: Mutex<VecDeque<PendingEntry>>,
    wake: WakeNotify,
    shutdown: CancellationToken,
    current: Mutex<Option<CommandId>>,
    current_handle: Mutex<Option<CancelHandle>>,
    cancel_message: Mutex<Option<String>>,
    ready: AtomicBool,
}

/// One FIFO worker driving one session's [`DebuggerAdapter`] (C5).
#[derive(Clone)]
pub struct IsolatedQueue<D, N, C> {
    shared: Arc<Shared<D, N, C>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<D, N, C> IsolatedQueue<D, N, C>
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Spawns the worker task. The returned [`oneshot::Receiver`] resolves
    /// once the worker has entered its main loop, the signal
    /// `SessionManager::create` awaits to resolve the queue-readiness race
    /// (SPEC_FULL.md §6, Open Question 1).
    pub fn spawn(
        driver: D,
        tracker: Arc<CommandTracker>,
        cache: Arc<ResultCache>,
        notifier: Notifier<N>,
        clock: C,
        shutdown: CancellationToken,
    ) -> (Self, oneshot::Receiver<()>) {
        let shared = Arc::new(Shared {
            driver,
            tracker,
            cache,
            timeouts: TimeoutService::new(),
            clock,
            notifier,
            pending: Mutex::new(VecDeque::new()),
            wake: WakeNotify::new(),
            shutdown,
            current: Mutex::new(None),
            current_handle: Mutex::new(None),
            cancel_message: Mutex::new(None),
            ready: AtomicBool::new(false),
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        let worker_shared = shared.clone();
        let handle = tokio::spawn(run_worker(worker_shared, ready_tx));

        (
            Self {
                shared,
                worker: Arc::new(Mutex::new(Some(handle))),
            },
            ready_rx,
        )
    }

    /// Registers with the Tracker, appends to the FIFO, publishes a
    /// `queued` notification, returns immediately.
    pub fn enqueue(&self, text: impl Into<String>) -> CommandId {
        let text = text.into();
        let now = self.shared.clock.now();
        let id = self.shared.tracker.register(text.clone(), now);
        self.shared.pending.lock().push_back(PendingEntry {
            id: id.clone(),
            text: text.clone(),
        });
        self.shared.wake.notify_one();

        let position = self
            .shared
            .tracker
            .get(&id, now)
            .map(|info| info.queue_position)
            .unwrap_or(0);
        self.shared.notifier.command_status(
            id.clone(),
            &text,
            CommandState::Queued,
            progress::compute_progress(position, Duration::ZERO),
            "queued",
            None,
            None,
        );
        id
    }

    /// Queued → removed from FIFO and marked `Cancelled`. Executing →
    /// cooperative cancellation token fired. Terminal → `false`.
    pub fn cancel(&self, id: &CommandId) -> bool {
        let now = self.shared.clock.now();

        let removed = {
            let mut pending = self.shared.pending.lock();
            let before = pending.len();
            pending.retain(|entry| &entry.id != id);
            before != pending.len()
        };
        if removed {
            self.shared.tracker.transition(id, CommandState::Cancelled, now);
            self.shared.tracker.recompute_positions();
            if let Some(info) = self.shared.tracker.get(id, now) {
                self.shared.notifier.command_status(
                    id.clone(),
                    &info.text,
                    CommandState::Cancelled,
                    100,
                    "cancelled",
                    None,
                    Some("cancelled by request".to_string()),
                );
            }
            return true;
        }

        let is_current = self.shared.current.lock().as_ref() == Some(id);
        if is_current {
            if let Some(handle) = self.shared.current_handle.lock().clone() {
                *self.shared.cancel_message.lock() = Some("cancelled by request".to_string());
                handle.user_cancelled.store(true, Ordering::SeqCst);
                handle.token.cancel();
                return true;
            }
        }
        false
    }

    /// Cancels every Queued command and, if one is Executing, requests its
    /// cooperative cancellation too. Returns the number of commands
    /// affected. Used by `close-session`.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let now = self.shared.clock.now();
        let drained: Vec<PendingEntry> = self.shared.pending.lock().drain(..).collect();
        let mut count = drained.len();
        for entry in &drained {
            self.shared
                .tracker
                .transition(&entry.id, CommandState::Cancelled, now);
            self.shared.notifier.command_status(
                entry.id.clone(),
                &entry.text,
                CommandState::Cancelled,
                100,
                "cancelled",
                None,
                Some(reason.to_string()),
            );
        }
        if let Some(handle) = self.shared.current_handle.lock().clone() {
            *self.shared.cancel_message.lock() = Some(reason.to_string());
            handle.user_cancelled.store(true, Ordering::SeqCst);
            handle.token.cancel();
            count += 1;
        }
        self.shared.tracker.recompute_positions();
        count
    }

    /// Interrupts the currently executing command's cooperative token
    /// without marking any terminal state, leaving the caller (the
    /// Recovery Controller) free to decide the final state itself. Returns
    /// the interrupted command's id, if any.
    pub fn interrupt_current(&self) -> Option<CommandId> {
        let current = self.shared.current.lock().clone();
        if current.is_some() {
            if let Some(handle) = self.shared.current_handle.lock().clone() {
                handle.token.cancel();
            }
        }
        current
    }

    /// Cancels any armed timeout for `id`, for callers (the Recovery
    /// Controller) that finalize a command's state directly.
    pub fn cancel_timeout(&self, id: &CommandId) {
        self.shared.timeouts.cancel(id);
    }

    /// Removes every still-Queued command, marking each `Failed` instead
    /// of `Cancelled`. Used by the Recovery Controller when driver restart
    /// is exhausted and the queue must be drained.
    pub fn drain_queued_as_failed(&self, message: &str) -> usize {
        let now = self.shared.clock.now();
        let drained: Vec<PendingEntry> = self.shared.pending.lock().drain(..).collect();
        let count = drained.len();
        for entry in &drained {
            self.shared
                .tracker
                .transition(&entry.id, CommandState::Failed, now);
            let result = CommandResult::failure(message.to_string(), Duration::ZERO);
            self.shared.cache.put(entry.id.clone(), result, now);
            self.shared.notifier.command_status(
                entry.id.clone(),
                &entry.text,
                CommandState::Failed,
                100,
                "failed",
                None,
                Some(message.to_string()),
            );
        }
        self.shared.tracker.recompute_positions();
        count
    }

    pub fn status(&self) -> Vec<crate::tracker::CommandInfo> {
        self.shared.tracker.list()
    }

    pub fn current_command(&self) -> Option<CommandId> {
        self.shared.current.lock().clone()
    }

    /// True once the worker has entered its main loop.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    pub async fn is_driver_active(&self) -> bool {
        self.shared.driver.is_active().await
    }

    /// Signals the worker to exit once idle and waits for it to finish.
    /// Does not dispose the driver; the caller disposes it after this
    /// returns, matching the "reverse dependency order" of `close-session`.
    pub async fn shutdown(&self) {
        self.shared.shutdown.cancel();
        self.shared.wake.notify_one();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.await;
        }
    }
}

async fn run_worker<D, N, C>(shared: Arc<Shared<D, N, C>>, ready_tx: oneshot::Sender<()>)
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    shared.ready.store(true, Ordering::SeqCst);
    let _ = ready_tx.send(());

    loop {
        let entry = loop {
            if let Some(entry) = shared.pending.lock().pop_front() {
                break Some(entry);
            }
            if shared.shutdown.is_cancelled() {
                break None;
            }
            tokio::select! {
                _ = shared.wake.notified() => continue,
                _ = shared.shutdown.cancelled() => continue,
            }
        };
        let Some(entry) = entry else { break };
        execute_one(&shared, entry).await;
    }
}

async fn execute_one<D, N, C>(shared: &Arc<Shared<D, N, C>>, entry: PendingEntry)
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let start = shared.clock.now();
    shared
        .tracker
        .transition(&entry.id, CommandState::Executing, start);
    shared.tracker.recompute_positions();
    *shared.current.lock() = Some(entry.id.clone());

    let handle = CancelHandle {
        token: CancellationToken::new(),
        user_cancelled: Arc::new(AtomicBool::new(false)),
    };
    *shared.current_handle.lock() = Some(handle.clone());

    let class_timeout = timeout_for(&entry.text);
    let timeout_token = handle.token.clone();
    shared.timeouts.arm(entry.id.clone(), class_timeout, async move {
        timeout_token.cancel();
    });

    shared.notifier.command_status(
        entry.id.clone(),
        &entry.text,
        CommandState::Executing,
        progress::compute_progress(0, Duration::ZERO),
        "executing",
        None,
        None,
    );

    let heartbeat_shared = shared.clone();
    let heartbeat_id = entry.id.clone();
    let heartbeat_token = handle.token.clone();
    let heartbeat_handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(HEARTBEAT_INTERVAL).await;
            if heartbeat_token.is_cancelled() {
                break;
            }
            let elapsed = heartbeat_shared.clock.now().saturating_duration_since(start);
            heartbeat_shared.notifier.heartbeat(heartbeat_id.clone(), elapsed);
        }
    });

    let outcome = shared
        .driver
        .execute(&entry.text, handle.token.clone())
        .await;

    heartbeat_handle.abort();
    shared.timeouts.cancel(&entry.id);

    let now = shared.clock.now();
    let duration = now.saturating_duration_since(start);

    // If the Recovery Controller already finalized this command directly
    // (e.g. marking it Failed with "session recovered" before interrupting
    // the token), don't clobber that state or result.
    let still_executing = shared
        .tracker
        .get(&entry.id, now)
        .map(|info| info.state)
        == Some(CommandState::Executing);

    if still_executing {
        match outcome {
            Ok(output) => {
                let result = CommandResult::success(output.clone(), duration);
                shared
                    .tracker
                    .transition(&entry.id, CommandState::Completed, now);
                shared.cache.put(entry.id.clone(), result, now);
                shared.notifier.command_status(
                    entry.id.clone(),
                    &entry.text,
                    CommandState::Completed,
                    100,
                    "completed",
                    Some(output),
                    None,
                );
            }
            Err(DriverError::Cancelled) if handle.user_cancelled.load(Ordering::SeqCst) => {
                let message = shared
                    .cancel_message
                    .lock()
                    .take()
                    .unwrap_or_else(|| "cancelled by request".to_string());
                shared
                    .tracker
                    .transition(&entry.id, CommandState::Cancelled, now);
                shared.notifier.command_status(
                    entry.id.clone(),
                    &entry.text,
                    CommandState::Cancelled,
                    100,
                    "cancelled",
                    None,
                    Some(message),
                );
            }
            Err(DriverError::Cancelled) => {
                // The Timeout Service fired this same token: a timeout is
                // a Failed result, not a Cancelled one (spec.md §7).
                let message = format!(
                    "command timed out after {}",
                    dbgx_core::format_elapsed(class_timeout.as_secs())
                );
                let result = CommandResult::failure(message.clone(), duration);
                shared
                    .tracker
                    .transition(&entry.id, CommandState::Failed, now);
                shared.cache.put(entry.id.clone(), result, now);
                shared.notifier.command_status(
                    entry.id.clone(),
                    &entry.text,
                    CommandState::Failed,
                    100,
                    "failed",
                    None,
                    Some(message),
                );
            }
            Err(err) => {
                let message = err.to_string();
                let result = CommandResult::failure(message.clone(), duration);
                shared
                    .tracker
                    .transition(&entry.id, CommandState::Failed, now);
                shared.cache.put(entry.id.clone(), result, now);
                shared.notifier.command_status(
                    entry.id.clone(),
                    &entry.text,
                    CommandState::Failed,
                    100,
                    "failed",
                    None,
                    Some(message),
                );
            }
        }
    }

    *shared.current_handle.lock() = None;
    *shared.current.lock() = None;
    shared.tracker.recompute_positions();
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
