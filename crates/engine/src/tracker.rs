// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command Tracker (C2): the canonical per-session registry of commands
//! and their state.

use crate::cache::ResultCache;
use dbgx_core::{CommandId, CommandIdGen, CommandState, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a terminal command is kept in the tracker once its result has
/// left the cache, per spec.md §3's command retention window.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(60 * 60);

/// A point-in-time snapshot of one command's tracked state.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub id: CommandId,
    pub text: String,
    pub state: CommandState,
    pub enqueued_at: Instant,
    pub started_at: Option<Instant>,
    pub completed_at: Option<Instant>,
    pub queue_position: u32,
}

impl CommandInfo {
    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            (None, _) => Duration::ZERO,
        }
    }
}

struct Entry {
    text: String,
    state: CommandState,
    enqueued_at: Instant,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
    queue_position: u32,
}

/// Canonical per-session command registry (C2).
///
/// A single [`parking_lot::Mutex`] guards the map, matching the teacher's
/// locking discipline of one mutex per component.
pub struct CommandTracker {
    session_id: SessionId,
    id_gen: CommandIdGen,
    entries: Mutex<HashMap<CommandId, Entry>>,
    order: Mutex<Vec<CommandId>>,
}

impl CommandTracker {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            id_gen: CommandIdGen::new(),
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
        }
    }

    /// Assigns a new command id, records enqueue time, state=Queued.
    pub fn register(&self, text: impl Into<String>, now: Instant) -> CommandId {
        let id = self.id_gen.next(&self.session_id);
        let mut entries = self.entries.lock();
        let position = entries
            .values()
            .filter(|e| e.state == CommandState::Queued)
            .count() as u32;
        entries.insert(
            id.clone(),
            Entry {
                text: text.into(),
                state: CommandState::Queued,
                enqueued_at: now,
                started_at: None,
                completed_at: None,
                queue_position: position,
            },
        );
        drop(entries);
        self.order.lock().push(id.clone());
        id
    }

    /// Validates and applies a state transition. Invalid transitions are
    /// logged and ignored, never fatal (spec.md §4.2).
    pub fn transition(&self, id: &CommandId, next: CommandState, now: Instant) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(id) else {
            tracing::warn!(command_id = %id, "transition on unknown command ignored");
            return;
        };
        if !entry.state.can_transition_to(next) {
            tracing::warn!(
                command_id = %id,
                from = %entry.state,
                to = %next,
                "invalid command state transition ignored"
            );
            return;
        }
        match next {
            CommandState::Executing => {
                entry.started_at = Some(now);
                entry.queue_position = 0;
            }
            CommandState::Completed | CommandState::Failed | CommandState::Cancelled => {
                entry.completed_at = Some(now);
                entry.queue_position = 0;
            }
            CommandState::Queued => {}
        }
        entry.state = next;
    }

    /// O(1) lookup; returns a snapshot including derived elapsed/remaining.
    pub fn get(&self, id: &CommandId, now: Instant) -> Option<CommandInfo> {
        let entries = self.entries.lock();
        let entry = entries.get(id)?;
        Some(CommandInfo {
            id: id.clone(),
            text: entry.text.clone(),
            state: entry.state,
            enqueued_at: entry.enqueued_at,
            started_at: entry.started_at,
            completed_at: entry.completed_at,
            queue_position: entry.queue_position,
        })
    }

    /// Ordered snapshot of all commands, ordered by enqueue time.
    pub fn list(&self) -> Vec<CommandInfo> {
        let order = self.order.lock();
        let entries = self.entries.lock();
        order
            .iter()
            .filter_map(|id| {
                entries.get(id).map(|entry| CommandInfo {
                    id: id.clone(),
                    text: entry.text.clone(),
                    state: entry.state,
                    enqueued_at: entry.enqueued_at,
                    started_at: entry.started_at,
                    completed_at: entry.completed_at,
                    queue_position: entry.queue_position,
                })
            })
            .collect()
    }

    /// Called after a dequeue: decrements the position of every still-Queued
    /// entry so positions stay contiguous starting at 0.
    pub fn recompute_positions(&self) {
        let mut entries = self.entries.lock();
        let mut queued_ids: Vec<CommandId> = entries
            .iter()
            .filter(|(_, e)| e.state == CommandState::Queued)
            .map(|(id, _)| id.clone())
            .collect();
        queued_ids.sort_by_key(|id| {
            entries
                .get(id)
                .map(|e| e.queue_position)
                .unwrap_or(u32::MAX)
        });
        for (position, id) in queued_ids.into_iter().enumerate() {
            if let Some(entry) = entries.get_mut(&id) {
                entry.queue_position = position as u32;
            }
        }
    }

    /// Removes terminal entries whose completion is older than the
    /// retention window and whose result is no longer in the cache (spec.md
    /// §3: removed after the grace window or once the cache evicts the
    /// result, whichever is later). Queries the cache's current membership
    /// rather than a latched "was cached at some point" flag, so an entry
    /// whose result the cache has since evicted is collected on the next
    /// sweep instead of leaking forever.
    pub fn gc(&self, now: Instant, cache: &ResultCache<CommandId>) {
        let mut entries = self.entries.lock();
        let mut order = self.order.lock();
        entries.retain(|id, entry| {
            let expired = entry.state.is_terminal()
                && entry
                    .completed_at
                    .is_some_and(|t| now.saturating_duration_since(t) >= RETENTION_WINDOW)
                && !cache.has(id);
            !expired
        });
        order.retain(|id| entries.contains_key(id));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
