// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery Controller (C6): restart a session's driver without losing
//! any other session.
//!
//! Triggers (spec.md §4.6): the Timeout Service firing on an unresponsive
//! driver, `DriverError::ChildCrashed`, a health sweep observing
//! `isActive()=false`, or an explicit recovery request. All of these are
//! detected by the caller (the Session Manager's background sweep, or the
//! queue worker surfacing a crashed command); this module only implements
//! the recovery protocol itself. Marking the session `Recovering`/`Active`/
//! `Error` is the caller's responsibility, since [`dbgx_core::SessionStatus`]
//! is owned by the Session Manager, not by this module.

use crate::cache::ResultCache;
use crate::notifications::Notifier;
use crate::queue::IsolatedQueue;
use crate::tracker::CommandTracker;
use dbgx_core::{Clock, CommandResult, CommandState};
use dbgx_driver::{DebuggerAdapter, NotifyAdapter};
use std::path::Path;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_FACTOR: u32 = 2;
const BACKOFF_CAP: Duration = Duration::from_secs(5);

/// Outcome of one recovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The driver restarted; the session should return to `Active`.
    Recovered,
    /// All restart attempts failed; the session should move to `Error`.
    Exhausted,
}

/// Runs the recovery protocol (spec.md §4.6, steps 2-5) against one
/// session's components.
///
/// Step 1 ("mark session Recovering") is the caller's job, done before
/// this is invoked so in-flight lookups see the transitional status
/// immediately.
#[allow(clippy::too_many_arguments)]
pub async fn recover<D, N, C>(
    driver: &D,
    queue: &IsolatedQueue<D, N, C>,
    tracker: &CommandTracker,
    cache: &ResultCache,
    notifier: &Notifier<N>,
    clock: &C,
    dump_path: &Path,
    symbols_path: Option<&Path>,
) -> RecoveryOutcome
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    fail_current_command(queue, tracker, cache, notifier, clock);

    tracing::info!("recovery: disposing unresponsive driver");
    driver.dispose().await;

    let mut attempt = 0u32;
    loop {
        match driver.start(dump_path, symbols_path).await {
            Ok(()) => {
                tracing::info!(attempt, "recovery: driver restarted");
                return RecoveryOutcome::Recovered;
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "recovery: driver restart attempt failed");
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    break;
                }
                let delay = std::cmp::min(
                    BACKOFF_BASE * BACKOFF_FACTOR.pow(attempt - 1),
                    BACKOFF_CAP,
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    let drained = queue.drain_queued_as_failed("session recovery failed, driver did not restart");
    notifier.health("error", false, drained, 0);
    RecoveryOutcome::Exhausted
}

/// Directly finalizes whatever command is currently executing as `Failed`
/// with the recovery message, then interrupts its cooperative token. The
/// worker's own completion path sees the command is no longer `Executing`
/// and skips overwriting this result (see `queue::execute_one`).
fn fail_current_command<D, N, C>(
    queue: &IsolatedQueue<D, N, C>,
    tracker: &CommandTracker,
    cache: &ResultCache,
    notifier: &Notifier<N>,
    clock: &C,
) where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    let Some(id) = queue.interrupt_current() else {
        return;
    };
    let now = clock.now();
    let message = "session recovered";
    tracker.transition(&id, CommandState::Failed, now);
    let text = tracker
        .get(&id, now)
        .map(|info| info.text)
        .unwrap_or_default();
    let result = CommandResult::failure(message, Duration::ZERO);
    cache.put(id.clone(), result, now);
    queue.cancel_timeout(&id);
    notifier.command_status(
        id,
        &text,
        CommandState::Failed,
        100,
        "failed",
        None,
        Some(message.to_string()),
    );
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
