// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result Cache (C3): bounded per-session store of completed results.

use dbgx_core::{CommandId, CommandResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// `{maxBytes, maxEntries, pressureThreshold}` from spec.md §4.3.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub max_bytes: usize,
    pub max_entries: usize,
    pub pressure_threshold: f64,
}

impl CacheConfig {
    /// Defaults used in tests, per spec.md §4.3 ("1 MiB/10 entries in tests").
    pub fn test_default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_entries: 10,
            pressure_threshold: 0.8,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::test_default()
    }
}

/// Snapshot returned by [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: usize,
    pub pressure: f64,
}

struct Entry {
    result: CommandResult,
    size: usize,
    /// Position in `Inner::order`; a fresh one is assigned on every touch so
    /// the least-recently-used entry is always `order`'s first key.
    seq: u64,
    last_access: Instant,
}

/// The map plus its LRU order index, held behind one mutex so the two never
/// drift apart.
struct Inner<K> {
    entries: HashMap<K, Entry>,
    /// `seq -> id`, ascending by recency; the front is the eviction
    /// candidate. Kept alongside `entries` instead of derived from it so
    /// picking and removing the LRU entry is `O(log n)` rather than a full
    /// scan.
    order: BTreeMap<u64, K>,
    next_seq: u64,
    total_bytes: usize,
}

/// Bounded, LRU-evicting store of completed command results (C3).
///
/// A single mutex guards the map and LRU bookkeeping together, matching
/// the "single mutex protects the map and the LRU order" rule of spec.md
/// §4.3. Generic over the key so the Extension Tracker (C9) can share this
/// implementation keyed by `ExtensionJobId` instead of `CommandId` (spec.md
/// §2: extension results "stored back into" this same component).
pub struct ResultCache<K = CommandId> {
    config: CacheConfig,
    inner: Mutex<Inner<K>>,
}

impl<K: std::hash::Hash + Eq + Clone> ResultCache<K> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_seq: 0,
                total_bytes: 0,
            }),
        }
    }

    /// Overwrites any prior entry, then evicts LRU entries until both
    /// budgets are satisfied. A single oversized result is still stored;
    /// everything else is evicted to make room for it.
    pub fn put(&self, id: K, result: CommandResult, now: Instant) {
        let size = result.size_estimate();
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.remove(&id) {
            inner.order.remove(&old.seq);
            inner.total_bytes -= old.size;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, id.clone());
        inner.total_bytes += size;
        inner.entries.insert(
            id,
            Entry {
                result,
                size,
                seq,
                last_access: now,
            },
        );

        Self::evict_until_within_budget(&mut inner, &self.config);
    }

    fn evict_until_within_budget(inner: &mut Inner<K>, config: &CacheConfig) {
        loop {
            let over_budget =
                inner.total_bytes > config.max_bytes || inner.entries.len() > config.max_entries;
            if !over_budget || inner.entries.len() <= 1 {
                break;
            }
            let Some((&lru_seq, lru_id)) = inner.order.iter().next() else {
                break;
            };
            let lru_id = lru_id.clone();
            inner.order.remove(&lru_seq);
            if let Some(entry) = inner.entries.remove(&lru_id) {
                inner.total_bytes -= entry.size;
            }
        }
    }

    /// Updates last-access time and recency order on hit.
    pub fn get(&self, id: &K, now: Instant) -> Option<CommandResult> {
        let mut inner = self.inner.lock();
        let seq = inner.entries.get(id)?.seq;
        inner.order.remove(&seq);

        let new_seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(new_seq, id.clone());

        let entry = inner.entries.get_mut(id)?;
        entry.seq = new_seq;
        entry.last_access = now;
        Some(entry.result.clone())
    }

    /// No LRU update.
    pub fn has(&self, id: &K) -> bool {
        self.inner.lock().entries.contains_key(id)
    }

    pub fn remove(&self, id: &K) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.remove(id) else {
            return false;
        };
        inner.order.remove(&entry.seq);
        inner.total_bytes -= entry.size;
        true
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.total_bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let pressure = if self.config.max_bytes == 0 {
            0.0
        } else {
            inner.total_bytes as f64 / self.config.max_bytes as f64
        };
        CacheStats {
            entries: inner.entries.len(),
            bytes: inner.total_bytes,
            pressure,
        }
    }

    /// `true` once the cache's `stats().pressure` is at or above
    /// `pressureThreshold`, used by the health sweep to proactively trim
    /// sessions nearing the global memory budget (SPEC_FULL.md §4).
    pub fn under_pressure(&self) -> bool {
        self.stats().pressure >= self.config.pressure_threshold
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
