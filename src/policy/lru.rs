//! # Recency-Ranked Policy (LRU)
//!
//! Each entry is ranked by the timestamp of its last access. Adding an entry
//! stamps it with the current time; every read overwrites the stamp. The
//! oldest stamp is evicted first.
//!
//! Timestamps come from a [`Clock`], so tests can substitute a
//! [`ManualClock`](crate::clock::ManualClock) and get a deterministic order.
//! Entries stamped in the same millisecond rank by insertion sequence, which
//! still evicts the one touched earlier.
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::clock::ManualClock;
//! use tiercache::policy::EvictionPolicy;
//! use tiercache::policy::lru::LruPolicy;
//!
//! let clock = ManualClock::ticking(0, 1);
//! let mut lru = LruPolicy::with_clock(clock);
//! lru.add_entry("a");
//! lru.add_entry("b");
//! lru.touch(&"a").unwrap();
//!
//! assert_eq!(lru.eviction_candidate(), Some(&"b"));
//! ```

use std::hash::Hash;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::ds::{HeapOrder, PriorityIndex};
use crate::error::PolicyError;
use crate::policy::{EvictionPolicy, PolicyKind, Touched, rerank};

/// Last-access policy.
#[derive(Debug)]
pub struct LruPolicy<K, C = SystemClock> {
    index: PriorityIndex<K, Timestamp>,
    clock: C,
}

impl<K> LruPolicy<K, SystemClock>
where
    K: Eq + Hash + Clone,
{
    /// Creates a policy stamped by wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<K> Default for LruPolicy<K, SystemClock>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> LruPolicy<K, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Creates a policy stamped by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self::with_capacity(clock, 0)
    }

    /// Creates a policy with room for `capacity` entries.
    pub fn with_capacity(clock: C, capacity: usize) -> Self {
        Self {
            index: PriorityIndex::with_capacity(HeapOrder::Ascending, capacity),
            clock,
        }
    }

    /// Returns the last-access timestamp for `key`.
    pub fn last_access(&self, key: &K) -> Option<Timestamp> {
        self.index.priority_of(key)
    }

    /// Borrows the underlying index.
    pub fn index(&self) -> &PriorityIndex<K, Timestamp> {
        &self.index
    }
}

impl<K, C> EvictionPolicy<K> for LruPolicy<K, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    type Priority = Timestamp;

    fn kind(&self) -> PolicyKind {
        PolicyKind::Lru
    }

    fn add_entry(&mut self, key: K) {
        let now = self.clock.now();
        self.index.insert(key, now);
    }

    fn touch(&mut self, key: &K) -> Result<Touched<Timestamp>, PolicyError> {
        let clock = &self.clock;
        rerank(&mut self.index, key, |_| clock.now())
    }

    fn eviction_candidate(&self) -> Option<&K> {
        self.index.peek().map(|record| record.key())
    }

    fn evict(&mut self) -> Result<K, PolicyError> {
        self.index.pop().map(|record| record.into_key())
    }

    fn remove(&mut self, key: &K) -> Result<Timestamp, PolicyError> {
        self.index.remove(key).map(|record| record.priority())
    }

    fn priority_of(&self, key: &K) -> Option<Timestamp> {
        self.index.priority_of(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn clear(&mut self) {
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn add_entry_stamps_current_time() {
        let clock = ManualClock::new(500);
        let mut lru = LruPolicy::with_clock(clock);
        lru.add_entry("a");
        assert_eq!(lru.last_access(&"a"), Some(Timestamp::from_millis(500)));
    }

    #[test]
    fn touch_overwrites_timestamp() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();
        let mut lru = LruPolicy::with_clock(clock);
        lru.add_entry("a");
        handle.set(99);
        let touched = lru.touch(&"a").unwrap();
        assert_eq!(touched.priority, Timestamp::from_millis(99));
        assert_eq!(lru.last_access(&"a"), Some(Timestamp::from_millis(99)));
    }

    #[test]
    fn evicts_oldest_access_first() {
        let clock = ManualClock::new(0);
        let handle = clock.clone();
        let mut lru = LruPolicy::with_clock(clock);
        lru.add_entry("a");
        handle.advance(1);
        lru.add_entry("b");
        handle.advance(1);
        lru.add_entry("c");
        handle.advance(1);
        lru.touch(&"a").unwrap();

        assert_eq!(lru.evict().unwrap(), "b");
        assert_eq!(lru.evict().unwrap(), "c");
        assert_eq!(lru.evict().unwrap(), "a");
    }

    #[test]
    fn same_millisecond_touch_still_counts_as_newer() {
        let mut lru = LruPolicy::with_clock(ManualClock::new(7));
        lru.add_entry("a");
        lru.add_entry("b");
        lru.touch(&"a").unwrap();
        assert_eq!(lru.eviction_candidate(), Some(&"b"));
    }

    #[test]
    fn touched_entry_is_always_hot() {
        let mut lru = LruPolicy::with_clock(ManualClock::ticking(1_000, 10));
        for key in ["a", "b", "c"] {
            lru.add_entry(key);
        }
        assert!(lru.touch(&"b").unwrap().hot);
    }

    #[test]
    fn touch_missing_key_is_not_found() {
        let mut lru: LruPolicy<&str, _> = LruPolicy::with_clock(ManualClock::new(0));
        assert_eq!(lru.touch(&"nope").unwrap_err(), PolicyError::NotFound);
        assert_eq!(lru.kind(), PolicyKind::Lru);
    }

    #[test]
    fn system_clock_policy_tracks_entries() {
        let mut lru = LruPolicy::new();
        lru.add_entry(1u64);
        assert!(lru.contains(&1));
        assert!(lru.last_access(&1).is_some());
    }
}
