// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Manager (C7): creates/closes sessions, enforces the session
//! cap, and owns each session's C1/C2/C3/C5 quartet.
//!
//! The registry lock (a [`parking_lot::RwLock`]) is held only across
//! `create`/`close`'s insert/remove; lookups take a read lock, which under
//! `parking_lot` is uncontended for the common case of many concurrent
//! readers and occasional writers, approximating the "atomic concurrent
//! map" spec.md §5 calls for without a cross-session mutex on the hot path.

use crate::cache::{CacheConfig, ResultCache};
use crate::extensions::ExtensionTracker;
use crate::notifications::Notifier;
use crate::queue::IsolatedQueue;
use crate::recovery::{self, RecoveryOutcome};
use crate::tracker::CommandTracker;
use dbgx_core::{Clock, ErrorKind, SessionId, SessionIdGen, SessionStatus};
use dbgx_driver::{DebuggerAdapter, NotifyAdapter};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Tunables for [`SessionManager`], resolved by `dbgx-daemon`'s config
/// layer from environment/TOML (SPEC_FULL.md §3).
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
    pub cache: CacheConfig,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10,
            idle_timeout: Duration::from_secs(30 * 60),
            cache: CacheConfig::default(),
        }
    }
}

/// One active debugging session: a dump file bound to one driver, tracker,
/// cache, and queue (spec.md §3's `Session`).
pub struct Session<D, N, C> {
    pub id: SessionId,
    pub dump_path: PathBuf,
    pub symbols_path: Option<PathBuf>,
    pub created_at: Instant,
    last_activity: Mutex<Instant>,
    status: Mutex<SessionStatus>,
    driver: D,
    tracker: Arc<CommandTracker>,
    cache: Arc<ResultCache>,
    queue: IsolatedQueue<D, N, C>,
    extensions: Arc<ExtensionTracker<N>>,
    notifier: Notifier<N>,
    clock: C,
    shutdown: CancellationToken,
}

impl<D, N, C> Session<D, N, C>
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    /// Updates last-activity time; called on any tool call referencing
    /// this session (spec.md §3's monotonic last-activity invariant).
    pub fn touch(&self, now: Instant) {
        *self.last_activity.lock() = now;
    }

    pub fn queue(&self) -> &IsolatedQueue<D, N, C> {
        &self.queue
    }

    pub fn tracker(&self) -> &Arc<CommandTracker> {
        &self.tracker
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn extensions(&self) -> &Arc<ExtensionTracker<N>> {
        &self.extensions
    }

    /// Exposes the session's [`Clock`], so callers translating an `Instant`
    /// snapshot (e.g. a command's `completed_at`) into wall-clock time don't
    /// need a clock of their own.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Creates/closes sessions, enforces the session cap, runs the idle and
/// health background sweeps (C7).
pub struct SessionManager<D, N, C> {
    config: SessionManagerConfig,
    driver_factory: Arc<dyn Fn() -> D + Send + Sync>,
    notify_adapter: N,
    clock: C,
    id_gen: SessionIdGen,
    sessions: RwLock<HashMap<SessionId, Arc<Session<D, N, C>>>>,
}

impl<D, N, C> SessionManager<D, N, C>
where
    D: DebuggerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(
        config: SessionManagerConfig,
        driver_factory: Arc<dyn Fn() -> D + Send + Sync>,
        notify_adapter: N,
        clock: C,
    ) -> Self {
        Self {
            config,
            driver_factory,
            notify_adapter,
            clock,
            id_gen: SessionIdGen::new(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Validates the dump file, enforces the session cap, starts the
    /// driver, and does not return until the queue worker has signalled
    /// readiness (resolving SPEC_FULL.md §6's queue-readiness race).
    pub async fn create(
        &self,
        dump_path: PathBuf,
        symbols_path: Option<PathBuf>,
    ) -> Result<SessionId, ErrorKind> {
        if !dump_path.exists() {
            return Err(ErrorKind::dump_file_missing(&dump_path.display().to_string()));
        }

        let current = self.sessions.read().len();
        if current >= self.config.max_sessions {
            return Err(ErrorKind::SessionLimitExceeded {
                current,
                max: self.config.max_sessions,
            });
        }

        let id = self.id_gen.next();
        let driver = (self.driver_factory)();
        driver
            .start(&dump_path, symbols_path.as_deref())
            .await
            .map_err(|err| ErrorKind::DriverStartFailed(err.to_string()))?;

        let tracker = Arc::new(CommandTracker::new(id.clone()));
        let cache = Arc::new(ResultCache::new(self.config.cache));
        let notifier = Notifier::new(id.clone(), self.notify_adapter.clone());
        let extensions = Arc::new(ExtensionTracker::new(notifier.clone(), self.config.cache));
        let shutdown = CancellationToken::new();
        let (queue, ready_rx) = IsolatedQueue::spawn(
            driver.clone(),
            tracker.clone(),
            cache.clone(),
            notifier.clone(),
            self.clock.clone(),
            shutdown.clone(),
        );
        let _ = ready_rx.await;

        let now = self.clock.now();
        let session = Arc::new(Session {
            id: id.clone(),
            dump_path,
            symbols_path,
            created_at: now,
            last_activity: Mutex::new(now),
            status: Mutex::new(SessionStatus::Active),
            driver,
            tracker,
            cache,
            queue,
            extensions,
            notifier,
            clock: self.clock.clone(),
            shutdown,
        });

        let mut sessions = self.sessions.write();
        if sessions.len() >= self.config.max_sessions {
            let max = self.config.max_sessions;
            drop(sessions);
            session.queue.shutdown().await;
            session.driver.dispose().await;
            return Err(ErrorKind::SessionLimitExceeded { current: max, max });
        }
        sessions.insert(id.clone(), session);
        Ok(id)
    }

    /// Idempotent: returns `false` for an id that is already gone.
    pub async fn close(&self, id: &SessionId) -> bool {
        let session = self.sessions.write().remove(id);
        let Some(session) = session else {
            return false;
        };
        *session.status.lock() = SessionStatus::Disposing;
        session.queue.cancel_all("session closing");
        session.queue.shutdown().await;
        session.driver.dispose().await;
        session.cache.clear();
        *session.status.lock() = SessionStatus::Disposed;
        session
            .notifier
            .health("closed", false, 0, 0);
        true
    }

    pub fn exists(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Session<D, N, C>>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn list_active(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .values()
            .filter(|session| session.status() == SessionStatus::Active)
            .map(|session| session.id.clone())
            .collect()
    }

    /// Returns the queue only once it is provably ready. Kept as a
    /// defensive fallback for callers holding a session handle obtained
    /// before `create`'s readiness guarantee applied (e.g. a stale `list()`
    /// snapshot); the documented path (`create`) never races.
    pub fn try_get_queue(&self, id: &SessionId) -> Result<IsolatedQueue<D, N, C>, ErrorKind> {
        let session = self
            .get(id)
            .ok_or_else(|| ErrorKind::SessionNotFound(id.to_string()))?;
        if !session.status().accepts_commands() {
            return Err(ErrorKind::SessionNotFound(id.to_string()));
        }
        if !session.queue.is_ready() {
            return Err(ErrorKind::QueueNotReady);
        }
        session.touch(self.clock.now());
        Ok(session.queue.clone())
    }

    /// Closes every session whose last activity is older than the
    /// configured idle timeout.
    pub async fn sweep_idle(&self) {
        let now = self.clock.now();
        let idle_timeout = self.config.idle_timeout;
        let expired: Vec<SessionId> = self
            .sessions
            .read()
            .values()
            .filter(|session| now.saturating_duration_since(session.last_activity()) >= idle_timeout)
            .map(|session| session.id.clone())
            .collect();
        for id in expired {
            tracing::info!(session_id = %id, "closing idle session");
            self.close(&id).await;
        }
    }

    /// Runs the driver liveness probe across every `Active` session,
    /// triggering recovery for any whose driver has stopped responding.
    pub async fn sweep_health(&self) {
        let candidates: Vec<Arc<Session<D, N, C>>> = self
            .sessions
            .read()
            .values()
            .filter(|session| session.status() == SessionStatus::Active)
            .cloned()
            .collect();
        for session in candidates {
            if !session.driver.is_active().await {
                self.recover_session(&session).await;
            }
        }
    }

    /// Explicit recovery request trigger (spec.md §4.6).
    pub async fn request_recovery(&self, id: &SessionId) -> bool {
        let Some(session) = self.get(id) else {
            return false;
        };
        self.recover_session(&session).await;
        true
    }

    async fn recover_session(&self, session: &Arc<Session<D, N, C>>) {
        *session.status.lock() = SessionStatus::Recovering;
        tracing::warn!(session_id = %session.id, "session driver unresponsive, starting recovery");
        let outcome = recovery::recover(
            &session.driver,
            &session.queue,
            &session.tracker,
            &session.cache,
            &session.notifier,
            &session.clock,
            &session.dump_path,
            session.symbols_path.as_deref(),
        )
        .await;
        *session.status.lock() = match outcome {
            RecoveryOutcome::Recovered => SessionStatus::Active,
            RecoveryOutcome::Exhausted => SessionStatus::Error,
        };
    }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
