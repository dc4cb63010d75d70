//! Cache Shard Module
//!
//! One independently locked partition of the sharded cache: a key index
//! plus the LRU ordering used for capacity eviction.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::CacheEntry;
use crate::cache::lru::LruOrder;

// == Read Outcome ==
/// Result of a shard read, distinguishing expired entries from plain misses
/// so the store can account for them separately.
#[derive(Debug)]
pub(crate) enum ReadOutcome<V> {
    Hit(V),
    Miss,
    Expired,
}

// == Shard ==
/// A bounded key/value partition.
///
/// Invariant: `entries` and `order` always track exactly the same key set,
/// and `entries.len()` never exceeds `capacity`.
#[derive(Debug)]
pub(crate) struct Shard<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: LruOrder,
    capacity: usize,
}

impl<V: Clone> Shard<V> {
    /// Creates an empty shard holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: LruOrder::new(),
            capacity,
        }
    }

    /// Looks up a key, promoting it on a live hit.
    ///
    /// An expired entry is removed on discovery rather than waiting for
    /// capacity eviction to reach it.
    pub fn read(&mut self, key: &str) -> ReadOutcome<V> {
        let Some(entry) = self.entries.get(key) else {
            return ReadOutcome::Miss;
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.order.forget(key);
            return ReadOutcome::Expired;
        }

        let value = entry.value.clone();
        self.order.touch(key);
        ReadOutcome::Hit(value)
    }

    /// Inserts or refreshes a key as most recently used.
    ///
    /// Returns `true` if a resident entry was evicted to make room. The
    /// eviction victim is the least recently touched key, whatever its
    /// remaining TTL.
    pub fn write(&mut self, key: &str, value: V, ttl: Duration) -> bool {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refresh(value, ttl);
            self.order.touch(key);
            return false;
        }

        let mut evicted = false;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_oldest() {
                self.entries.remove(&oldest);
                evicted = true;
            }
        }

        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.order.touch(key);
        evicted
    }

    /// Removes a key if present; returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.forget(key);
            true
        } else {
            false
        }
    }

    /// Current number of resident entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Asserts the index/order bijection and the capacity bound.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        assert_eq!(self.entries.len(), self.order.len(), "index/order size diverged");
        assert!(self.entries.len() <= self.capacity, "capacity exceeded");
        for key in self.entries.keys() {
            assert!(self.order.contains(key), "indexed key missing from order: {key}");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_write_then_read() {
        let mut shard = Shard::new(4);
        shard.write("k1", 10, TTL);

        assert!(matches!(shard.read("k1"), ReadOutcome::Hit(10)));
        assert!(matches!(shard.read("missing"), ReadOutcome::Miss));
        shard.check_invariants();
    }

    #[test]
    fn test_write_refreshes_existing_key() {
        let mut shard = Shard::new(4);
        shard.write("k1", 1, TTL);
        shard.write("k1", 2, TTL);

        assert_eq!(shard.len(), 1);
        assert!(matches!(shard.read("k1"), ReadOutcome::Hit(2)));
        shard.check_invariants();
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut shard = Shard::new(2);
        assert!(!shard.write("a", 1, TTL));
        assert!(!shard.write("b", 2, TTL));
        assert!(shard.write("c", 3, TTL));

        assert_eq!(shard.len(), 2);
        assert!(matches!(shard.read("a"), ReadOutcome::Miss));
        assert!(matches!(shard.read("b"), ReadOutcome::Hit(2)));
        assert!(matches!(shard.read("c"), ReadOutcome::Hit(3)));
        shard.check_invariants();
    }

    #[test]
    fn test_read_promotes_key() {
        let mut shard = Shard::new(2);
        shard.write("a", 1, TTL);
        shard.write("b", 2, TTL);

        // touch "a" so "b" becomes the eviction victim
        assert!(matches!(shard.read("a"), ReadOutcome::Hit(1)));
        shard.write("c", 3, TTL);

        assert!(matches!(shard.read("a"), ReadOutcome::Hit(1)));
        assert!(matches!(shard.read("b"), ReadOutcome::Miss));
        shard.check_invariants();
    }

    #[test]
    fn test_expired_entry_reads_as_absent_and_is_dropped() {
        let mut shard = Shard::new(4);
        shard.write("k1", 1, Duration::from_millis(20));

        sleep(Duration::from_millis(40));
        assert!(matches!(shard.read("k1"), ReadOutcome::Expired));
        assert_eq!(shard.len(), 0);

        // a second read is a plain miss
        assert!(matches!(shard.read("k1"), ReadOutcome::Miss));
        shard.check_invariants();
    }

    #[test]
    fn test_eviction_ignores_ttl() {
        let mut shard = Shard::new(2);
        // "a" is close to expiring but "b" is older by recency after the touch
        shard.write("a", 1, Duration::from_secs(1));
        shard.write("b", 2, TTL);
        assert!(matches!(shard.read("a"), ReadOutcome::Hit(1)));

        // victim is "b": least recently touched, regardless of expiry times
        shard.write("c", 3, TTL);
        assert!(matches!(shard.read("b"), ReadOutcome::Miss));
        assert!(matches!(shard.read("a"), ReadOutcome::Hit(1)));
        shard.check_invariants();
    }

    #[test]
    fn test_remove() {
        let mut shard = Shard::new(4);
        shard.write("k1", 1, TTL);

        assert!(shard.remove("k1"));
        assert!(!shard.remove("k1"));
        assert!(matches!(shard.read("k1"), ReadOutcome::Miss));
        shard.check_invariants();
    }
}
