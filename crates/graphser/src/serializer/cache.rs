// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Build-once concurrent cache for serializers and type information.
//!
//! A miss installs an empty cell under the shard lock, then builds outside
//! it; concurrent callers for the same key wait on that cell and observe the
//! single winner. A failed build removes its cell so a later call can retry.
//! Builders must not request their own key (they would wait on themselves);
//! nested types are resolved lazily by the serializers instead.
//!
//! A bounded cache stamps each entry with a logical clock on every access
//! and, once over capacity, evicts the least recently used completed entry.
//! Hits only touch atomics; eviction scans the map and runs on misses only.

use crate::error::Result;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub last_miss_ns: u64,
}

/// Lock-free hit/miss counters behind [`LookupStats`].
#[derive(Debug, Default)]
pub(crate) struct LookupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    last_miss_ns: AtomicU64,
}

impl LookupCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self, start: Instant) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        let elapsed = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.last_miss_ns.store(elapsed, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LookupStats {
        LookupStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            last_miss_ns: self.last_miss_ns.load(Ordering::Relaxed),
        }
    }
}

struct Slot<V> {
    cell: OnceCell<Arc<V>>,
    last_used: AtomicU64,
}

impl<V> Slot<V> {
    fn new(tick: u64) -> Self {
        Self {
            cell: OnceCell::new(),
            last_used: AtomicU64::new(tick),
        }
    }

    fn touch(&self, tick: u64) {
        self.last_used.fetch_max(tick, Ordering::Relaxed);
    }
}

pub struct BuildOnceCache<K, V> {
    entries: DashMap<K, Arc<Slot<V>>>,
    /// `None` keeps every entry.
    capacity: Option<NonZeroUsize>,
    clock: AtomicU64,
    counters: LookupCounters,
}

impl<K: Eq + Hash + Clone, V> BuildOnceCache<K, V> {
    /// Cache that never evicts; for keys drawn from local registrations.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            capacity: None,
            clock: AtomicU64::new(0),
            counters: LookupCounters::default(),
        }
    }

    /// Cache holding at most `capacity` completed entries (zero counts as one).
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            ..Self::new()
        }
    }

    pub fn get_or_try_build<F>(&self, key: &K, build: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(hit) = self.get(key) {
            self.counters.record_hit();
            return Ok(hit);
        }

        let slot = Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new(self.tick())))
                .value(),
        );

        let start = Instant::now();
        let mut built_here = false;
        let built = slot.cell.get_or_try_init(|| {
            built_here = true;
            build().map(Arc::new)
        });
        match built {
            Ok(value) => {
                let value = Arc::clone(value);
                slot.touch(self.tick());
                if built_here {
                    self.counters.record_miss(start);
                    self.evict_over_capacity(key);
                } else {
                    self.counters.record_hit();
                }
                Ok(value)
            }
            Err(err) => {
                self.entries.remove_if(key, |_, current| {
                    Arc::ptr_eq(current, &slot) && current.cell.get().is_none()
                });
                Err(err)
            }
        }
    }

    /// Completed entry, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let slot = self.entries.get(key)?;
        let value = slot.cell.get().map(Arc::clone)?;
        if self.capacity.is_some() {
            slot.touch(self.tick());
        }
        Some(value)
    }

    /// Install a completed entry, replacing any previous one.
    pub fn insert(&self, key: K, value: Arc<V>) {
        let slot = Slot {
            cell: OnceCell::with_value(value),
            last_used: AtomicU64::new(self.tick()),
        };
        self.entries.insert(key.clone(), Arc::new(slot));
        self.evict_over_capacity(&key);
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Completed and in-flight entries.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    pub fn stats(&self) -> LookupStats {
        self.counters.snapshot()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop least recently used completed entries other than `keep`.
    fn evict_over_capacity(&self, keep: &K) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.entries.len() > capacity.get() {
            let oldest = self
                .entries
                .iter()
                .filter(|entry| entry.key() != keep && entry.value().cell.get().is_some())
                .min_by_key(|entry| entry.value().last_used.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());
            match oldest {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                // Only in-flight builds left.
                None => break,
            }
        }
    }
}

impl<K: Eq + Hash + Clone, V> Default for BuildOnceCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
