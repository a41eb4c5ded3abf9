// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extension Tracker (C9): a parallel registry for long-running extension
//! script jobs, tracked the same way ordinary commands are but under their
//! own `ext-<uuid>` id namespace and a flat 30-minute timeout.
//!
//! The extension runner itself is an opaque external collaborator (spec.md
//! §1): this module only records state transitions and callback progress
//! reported by that runner, and stores the eventual result in a
//! [`ResultCache`] keyed by [`ExtensionJobId`] — the same component C3
//! uses for ordinary commands, per spec.md §2's "output ... stored back
//! into C3".

use crate::cache::{CacheConfig, ResultCache};
use crate::notifications::Notifier;
use dbgx_core::{CommandResult, CommandState, ExtensionJob, ExtensionJobId};
use dbgx_driver::NotifyAdapter;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    job: ExtensionJob,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
}

/// Per-session registry of extension jobs (C9).
pub struct ExtensionTracker<N> {
    notifier: Notifier<N>,
    jobs: Mutex<HashMap<ExtensionJobId, Entry>>,
    results: ResultCache<ExtensionJobId>,
}

impl<N: NotifyAdapter> ExtensionTracker<N> {
    pub fn new(notifier: Notifier<N>, cache_config: CacheConfig) -> Self {
        Self {
            notifier,
            jobs: Mutex::new(HashMap::new()),
            results: ResultCache::new(cache_config),
        }
    }

    /// Registers a new extension job, state=Queued, and publishes a
    /// `queued` notification.
    pub fn register(
        &self,
        extension_name: impl Into<String>,
        parameters: Option<serde_json::Value>,
    ) -> ExtensionJobId {
        let extension_name = extension_name.into();
        let job = ExtensionJob::new(extension_name.clone(), parameters);
        let id = job.id.clone();
        self.jobs.lock().insert(
            id.clone(),
            Entry {
                job,
                started_at: None,
                completed_at: None,
            },
        );
        self.notifier
            .extension_status(id.as_str(), &extension_name, "queued", None);
        id
    }

    /// Queued -> Executing, recording the start time.
    pub fn start(&self, id: &ExtensionJobId, now: Instant) {
        let mut jobs = self.jobs.lock();
        let Some(entry) = jobs.get_mut(id) else {
            return;
        };
        if !entry.job.state.can_transition_to(CommandState::Executing) {
            return;
        }
        entry.job.state = CommandState::Executing;
        entry.started_at = Some(now);
        let name = entry.job.extension_name.clone();
        drop(jobs);
        self.notifier
            .extension_status(id.as_str(), &name, "executing", None);
    }

    /// Records a progress callback from the extension runner, bumping its
    /// callback count (spec.md §3's `ExtensionJob.callback-count`).
    pub fn record_callback(&self, id: &ExtensionJobId, message: impl Into<String>) {
        let message = message.into();
        let mut jobs = self.jobs.lock();
        let Some(entry) = jobs.get_mut(id) else {
            return;
        };
        entry.job.record_callback(message.clone());
        let name = entry.job.extension_name.clone();
        drop(jobs);
        self.notifier
            .extension_status(id.as_str(), &name, "executing", Some(message));
    }

    /// Executing -> Completed, storing the result blob both on the job
    /// record and in the shared result cache.
    pub fn complete(&self, id: &ExtensionJobId, result: serde_json::Value, now: Instant) {
        let name = {
            let mut jobs = self.jobs.lock();
            let Some(entry) = jobs.get_mut(id) else {
                return;
            };
            if !entry.job.state.can_transition_to(CommandState::Completed) {
                return;
            }
            entry.job.state = CommandState::Completed;
            entry.job.result = Some(result.clone());
            entry.completed_at = Some(now);
            if let Some(start) = entry.started_at {
                entry.job.elapsed = now.saturating_duration_since(start);
            }
            entry.job.extension_name.clone()
        };
        self.results.put(
            id.clone(),
            CommandResult::success(result.to_string(), Duration::ZERO),
            now,
        );
        self.notifier
            .extension_status(id.as_str(), &name, "completed", None);
    }

    /// Executing -> Failed.
    pub fn fail(&self, id: &ExtensionJobId, error: impl Into<String>, now: Instant) {
        let error = error.into();
        let name = {
            let mut jobs = self.jobs.lock();
            let Some(entry) = jobs.get_mut(id) else {
                return;
            };
            if !entry.job.state.can_transition_to(CommandState::Failed) {
                return;
            }
            entry.job.state = CommandState::Failed;
            entry.job.error = Some(error.clone());
            entry.completed_at = Some(now);
            entry.job.extension_name.clone()
        };
        self.results.put(
            id.clone(),
            CommandResult::failure(error.clone(), Duration::ZERO),
            now,
        );
        self.notifier
            .extension_status(id.as_str(), &name, "failed", Some(error));
    }

    /// Queued or Executing -> Cancelled. Returns `false` for an unknown or
    /// already-terminal job.
    pub fn cancel(&self, id: &ExtensionJobId, now: Instant) -> bool {
        let name = {
            let mut jobs = self.jobs.lock();
            let Some(entry) = jobs.get_mut(id) else {
                return false;
            };
            if entry.job.state.is_terminal() {
                return false;
            }
            entry.job.state = CommandState::Cancelled;
            entry.job.error = Some("cancelled".to_string());
            entry.completed_at = Some(now);
            entry.job.extension_name.clone()
        };
        self.notifier
            .extension_status(id.as_str(), &name, "cancelled", None);
        true
    }

    pub fn get(&self, id: &ExtensionJobId) -> Option<ExtensionJob> {
        self.jobs.lock().get(id).map(|e| e.job.clone())
    }

    pub fn list(&self) -> Vec<ExtensionJob> {
        self.jobs.lock().values().map(|e| e.job.clone()).collect()
    }

    /// Removes terminal jobs completed more than `retention` ago.
    pub fn gc(&self, now: Instant, retention: Duration) {
        self.jobs.lock().retain(|_, entry| {
            !entry
                .job
                .state
                .is_terminal()
                || entry
                    .completed_at
                    .is_none_or(|t| now.saturating_duration_since(t) < retention)
        });
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "extensions_tests.rs"]
mod tests;
