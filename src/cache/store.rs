//! Sharded Cache Store
//!
//! The cache engine: a fixed array of independently locked LRU+TTL shards.
//! Keys route to exactly one shard by a stable hash, so contention is bounded
//! to same-shard traffic and cross-shard operations never serialize.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::cache::shard::{ReadOutcome, Shard};
use crate::cache::stats::{CacheStats, StatsSnapshot};

// == Sharded Cache ==
/// A thread-safe LRU cache with per-entry TTL, partitioned into shards.
///
/// Shard count, total capacity and TTL are fixed at construction. All
/// operations take `&self`; each shard guards its own state with a mutex
/// that is held only for short, non-blocking critical sections.
#[derive(Debug)]
pub struct ShardedCache<V> {
    shards: Vec<Mutex<Shard<V>>>,
    ttl: Duration,
    stats: CacheStats,
}

impl<V: Clone> ShardedCache<V> {
    // == Constructor ==
    /// Creates a cache of `shard_count` shards sharing `capacity` slots.
    ///
    /// Capacity divides evenly across shards with a minimum of one slot per
    /// shard; a zero shard count is clamped to one.
    pub fn new(shard_count: usize, capacity: usize, ttl: Duration) -> Self {
        let shard_count = shard_count.max(1);
        let per_shard = (capacity / shard_count).max(1);

        let shards = (0..shard_count)
            .map(|_| Mutex::new(Shard::new(per_shard)))
            .collect();

        Self {
            shards,
            ttl,
            stats: CacheStats::new(),
        }
    }

    // == Shard Routing ==
    /// Locks the shard owning `key`.
    ///
    /// `DefaultHasher::new()` hashes with fixed keys, so routing is stable
    /// for the lifetime of the cache. A poisoned shard is still structurally
    /// sound (writers uphold the shard invariants before any call that can
    /// panic), so the guard is recovered rather than propagated.
    fn shard_for(&self, key: &str) -> MutexGuard<'_, Shard<V>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();

        match self.shards[index].lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // == Get ==
    /// Returns the live value for `key`, promoting it to most recently used.
    ///
    /// Absent keys and expired entries both read as `None`; an expired entry
    /// is removed on discovery.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.shard_for(key).read(key) {
            ReadOutcome::Hit(value) => {
                self.stats.record_hit();
                Some(value)
            }
            ReadOutcome::Miss => {
                self.stats.record_miss();
                None
            }
            ReadOutcome::Expired => {
                self.stats.record_expiration();
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts `value` under `key`, or refreshes the existing entry.
    ///
    /// Either way the entry becomes most recently used with a full TTL.
    /// When the owning shard is at capacity, its least recently used entry
    /// is evicted first.
    pub fn set(&self, key: &str, value: V) {
        let evicted = self.shard_for(key).write(key, value, self.ttl);
        if evicted {
            self.stats.record_eviction();
        }
    }

    // == Delete ==
    /// Removes `key` if present; no-op otherwise.
    pub fn delete(&self, key: &str) {
        self.shard_for(key).remove(key);
    }

    // == Introspection ==
    /// Total resident entries across all shards.
    ///
    /// Shards are sampled one at a time, so the sum is approximate while
    /// writers are active.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| match shard.lock() {
                Ok(guard) => guard.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of shards fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Point-in-time operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
