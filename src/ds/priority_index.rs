//! Keyed binary heap of priority records.
//!
//! A priority queue that ranks one record per key by a policy-supplied
//! priority. Unlike a plain `BinaryHeap`, records can be detached by key, which
//! is how policies re-rank an entry: remove the record, compute its new
//! priority, insert it again.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        PriorityIndex Layout                                 │
//! │                                                                             │
//! │   ┌───────────────────────────────────────────────────────────────────┐    │
//! │   │  slots: Vec<Slot<K, P>>   (implicit binary heap)                  │    │
//! │   │                                                                   │    │
//! │   │              [0] ("B", 1, seq=1)   ← lowest rank, next victim     │    │
//! │   │             /                  \                                  │    │
//! │   │   [1] ("C", 2, seq=4)    [2] ("A", 3, seq=3)                      │    │
//! │   └───────────────────────────────────────────────────────────────────┘    │
//! │                                                                             │
//! │   ┌───────────────────────────────────────────────────────────────────┐    │
//! │   │  positions: FxHashMap<K, usize>   (key → slot)                    │    │
//! │   │                                                                   │    │
//! │   │    "A" → 2     "B" → 0     "C" → 1                               │    │
//! │   └───────────────────────────────────────────────────────────────────┘    │
//! │                                                                             │
//! │   order: Ascending | Descending     priority_sum: 6     seq: 5             │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Re-rank Flow
//! ────────────
//!   remove("A")            → swap_remove slot 2, fix positions, sift
//!   insert("A", 4)         → push slot, sift_up, positions["A"] = new slot
//! ```
//!
//! ## Key Concepts
//!
//! - **Identity vs. rank**: [`PriorityRecord`] equality and hashing use the key
//!   alone; ranking uses the priority through the index's [`HeapOrder`]
//! - **Inverted ordering**: a descending index is the same heap with the
//!   priority comparison reversed, not a different structure
//! - **Sequence numbers**: equal priorities rank by insertion sequence, older
//!   first. This is an implementation detail; callers must not depend on it
//! - **Running sum**: the sum of all priority magnitudes is kept current so the
//!   mean priority is available in O(1)
//!
//! ## Operations
//!
//! | Operation  | Description                              | Complexity |
//! |------------|------------------------------------------|------------|
//! | `insert`   | Add a record (replaces an existing key)  | O(log n)   |
//! | `pop`      | Detach the lowest-ranked record          | O(log n)   |
//! | `peek`     | Borrow the lowest-ranked record          | O(1)       |
//! | `remove`   | Detach the record for a key              | O(log n)   |
//! | `contains` | Membership test by key                   | O(1)       |
//! | `clear`    | Drop everything                          | O(n)       |
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::ds::{HeapOrder, PriorityIndex};
//!
//! let mut index: PriorityIndex<&str, u64> = PriorityIndex::new(HeapOrder::Ascending);
//! index.insert("a", 3);
//! index.insert("b", 1);
//! index.insert("c", 2);
//!
//! // Re-rank "b": remove, bump, reinsert.
//! let record = index.remove(&"b").unwrap();
//! index.insert(*record.key(), record.priority() + 5);
//!
//! assert_eq!(index.pop().unwrap().key(), &"c");
//! assert_eq!(index.pop().unwrap().key(), &"a");
//! assert_eq!(index.pop().unwrap().key(), &"b");
//! assert!(index.pop().is_err());
//! ```
//!
//! ## Thread Safety
//!
//! `PriorityIndex` is not thread-safe. Every operation runs to completion on
//! the caller's thread.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

use crate::error::PolicyError;

/// A rank value a [`PriorityIndex`] can order and average.
pub trait Priority: Copy + Ord + fmt::Debug {
    /// Non-negative magnitude used when averaging priorities.
    fn magnitude(self) -> u128;
}

impl Priority for u64 {
    #[inline]
    fn magnitude(self) -> u128 {
        u128::from(self)
    }
}

impl Priority for u32 {
    #[inline]
    fn magnitude(self) -> u128 {
        u128::from(self)
    }
}

/// Direction in which a [`PriorityIndex`] ranks priorities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HeapOrder {
    /// Smallest priority ranks lowest (is popped first).
    #[default]
    Ascending,
    /// Largest priority ranks lowest (is popped first).
    Descending,
}

impl HeapOrder {
    /// Compares two priorities under this order.
    ///
    /// `Ordering::Less` means `a` ranks lower than `b` and leaves first.
    #[inline]
    pub fn compare<P: Ord>(self, a: &P, b: &P) -> Ordering {
        match self {
            HeapOrder::Ascending => a.cmp(b),
            HeapOrder::Descending => b.cmp(a),
        }
    }
}

/// A key together with its current rank.
///
/// Two records are equal when their keys are equal, whatever their
/// priorities. Ranking is done by the owning index, so the record does not
/// implement `Ord`.
#[derive(Debug, Clone)]
pub struct PriorityRecord<K, P> {
    key: K,
    priority: P,
}

impl<K, P: Copy + Ord> PriorityRecord<K, P> {
    /// Creates a detached record.
    #[inline]
    pub fn new(key: K, priority: P) -> Self {
        Self { key, priority }
    }

    /// Returns the record's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the record's priority.
    #[inline]
    pub fn priority(&self) -> P {
        self.priority
    }

    /// Consumes the record, returning its key.
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Consumes the record, returning key and priority.
    #[inline]
    pub fn into_parts(self) -> (K, P) {
        (self.key, self.priority)
    }
}

impl<K: PartialEq, P> PartialEq for PriorityRecord<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, P> Eq for PriorityRecord<K, P> {}

impl<K: Hash, P> Hash for PriorityRecord<K, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[derive(Debug, Clone)]
struct Slot<K, P> {
    record: PriorityRecord<K, P>,
    seq: u64,
}

/// Binary heap of [`PriorityRecord`]s with removal by key.
///
/// Holds at most one record per key. The heap property (every parent ranks no
/// higher than its children under the active [`HeapOrder`]) holds after every
/// public operation.
///
/// # Type Parameters
///
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `P`: Priority type (must implement [`Priority`])
///
/// # Example
///
/// ```
/// use tiercache::ds::{HeapOrder, PriorityIndex};
///
/// // Descending: the largest priority leaves first.
/// let mut index: PriorityIndex<&str, u64> = PriorityIndex::new(HeapOrder::Descending);
/// index.insert("cold", 1);
/// index.insert("hot", 9);
///
/// assert_eq!(index.peek().map(|r| *r.key()), Some("hot"));
/// assert_eq!(index.priority_sum(), 10);
/// ```
pub struct PriorityIndex<K, P> {
    slots: Vec<Slot<K, P>>,
    positions: FxHashMap<K, usize>,
    order: HeapOrder,
    seq: u64,
    priority_sum: u128,
}

impl<K, P> PriorityIndex<K, P>
where
    K: Eq + Hash + Clone,
    P: Priority,
{
    /// Creates an empty index ranking by `order`.
    pub fn new(order: HeapOrder) -> Self {
        Self::with_capacity(order, 0)
    }

    /// Creates an empty index with room for `capacity` records.
    pub fn with_capacity(order: HeapOrder, capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order,
            seq: 0,
            priority_sum: 0,
        }
    }

    /// Returns the ranking direction.
    #[inline]
    pub fn order(&self) -> HeapOrder {
        self.order
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the index holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` if a record for `key` is present.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Returns the current priority for `key`, if present.
    pub fn priority_of(&self, key: &K) -> Option<P> {
        self.positions
            .get(key)
            .map(|&pos| self.slots[pos].record.priority)
    }

    /// Returns the sum of all priority magnitudes.
    #[inline]
    pub fn priority_sum(&self) -> u128 {
        self.priority_sum
    }

    /// Borrows the lowest-ranked record without detaching it.
    #[inline]
    pub fn peek(&self) -> Option<&PriorityRecord<K, P>> {
        self.slots.first().map(|slot| &slot.record)
    }

    /// Adds a record for `key`.
    ///
    /// Callers are expected to insert each key once. If a record for `key`
    /// is already present it is detached first and its priority is returned,
    /// so the index never holds two records for one key.
    pub fn insert(&mut self, key: K, priority: P) -> Option<P> {
        let previous = self.remove(&key).ok().map(|record| record.priority);

        let pos = self.slots.len();
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        self.positions.insert(key.clone(), pos);
        self.slots.push(Slot {
            record: PriorityRecord::new(key, priority),
            seq,
        });
        self.priority_sum += priority.magnitude();
        self.sift_up(pos);

        previous
    }

    /// Detaches and returns the lowest-ranked record.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyIndex`] if there are no records.
    pub fn pop(&mut self) -> Result<PriorityRecord<K, P>, PolicyError> {
        if self.slots.is_empty() {
            return Err(PolicyError::EmptyIndex);
        }
        Ok(self.detach(0))
    }

    /// Detaches and returns the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] if no record matches.
    pub fn remove(&mut self, key: &K) -> Result<PriorityRecord<K, P>, PolicyError> {
        let pos = *self.positions.get(key).ok_or(PolicyError::NotFound)?;
        Ok(self.detach(pos))
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.positions.clear();
        self.priority_sum = 0;
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.positions.len(), self.slots.len());
        let mut sum = 0u128;
        for (pos, slot) in self.slots.iter().enumerate() {
            assert_eq!(self.positions.get(&slot.record.key), Some(&pos));
            if pos > 0 {
                let parent = (pos - 1) / 2;
                assert!(!self.ranks_before(pos, parent), "heap order violated at {pos}");
            }
            sum += slot.record.priority.magnitude();
        }
        assert_eq!(sum, self.priority_sum);
    }

    fn detach(&mut self, pos: usize) -> PriorityRecord<K, P> {
        let slot = self.slots.swap_remove(pos);
        self.positions.remove(&slot.record.key);
        self.priority_sum -= slot.record.priority.magnitude();

        if pos < self.slots.len() {
            if let Some(moved) = self.positions.get_mut(&self.slots[pos].record.key) {
                *moved = pos;
            }
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }

        slot.record
    }

    /// `true` if slot `a` must leave before slot `b`.
    #[inline]
    fn ranks_before(&self, a: usize, b: usize) -> bool {
        let (x, y) = (&self.slots[a], &self.slots[b]);
        self.order
            .compare(&x.record.priority, &y.record.priority)
            .then(x.seq.cmp(&y.seq))
            == Ordering::Less
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.ranks_before(pos, parent) {
                break;
            }
            self.swap_slots(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.ranks_before(right, left) {
                right
            } else {
                left
            };
            if !self.ranks_before(child, pos) {
                break;
            }
            self.swap_slots(pos, child);
            pos = child;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
        if let Some(p) = self.positions.get_mut(&self.slots[a].record.key) {
            *p = a;
        }
        if let Some(p) = self.positions.get_mut(&self.slots[b].record.key) {
            *p = b;
        }
    }
}

impl<K, P> fmt::Debug for PriorityIndex<K, P>
where
    K: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityIndex")
            .field("order", &self.order)
            .field("len", &self.slots.len())
            .field("priority_sum", &self.priority_sum)
            .field("peek", &self.slots.first().map(|slot| &slot.record))
            .finish()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Operation {
        Insert(u8, u64),
        Remove(u8),
        Pop,
    }

    fn operation_strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            3 => (0u8..32, 0u64..1000).prop_map(|(k, p)| Operation::Insert(k, p)),
            1 => (0u8..32).prop_map(Operation::Remove),
            1 => Just(Operation::Pop),
        ]
    }

    proptest! {
        /// Arbitrary operation sequences keep the heap, side map and sum consistent.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_arbitrary_ops_maintain_invariants(
            descending in any::<bool>(),
            ops in prop::collection::vec(operation_strategy(), 0..300)
        ) {
            let order = if descending { HeapOrder::Descending } else { HeapOrder::Ascending };
            let mut index = PriorityIndex::new(order);
            let mut model = std::collections::HashMap::new();

            for op in ops {
                match op {
                    Operation::Insert(k, p) => {
                        prop_assert_eq!(index.insert(k, p), model.insert(k, p));
                    }
                    Operation::Remove(k) => {
                        let removed = index.remove(&k).ok().map(|r| r.priority());
                        prop_assert_eq!(removed, model.remove(&k));
                    }
                    Operation::Pop => {
                        if let Ok(record) = index.pop() {
                            let expected = if descending {
                                model.values().max().copied()
                            } else {
                                model.values().min().copied()
                            };
                            prop_assert_eq!(Some(record.priority()), expected);
                            model.remove(record.key());
                        } else {
                            prop_assert!(model.is_empty());
                        }
                    }
                }
                index.debug_validate_invariants();
                prop_assert_eq!(index.len(), model.len());
            }
        }

        /// Draining an index yields priorities in rank order.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_drain_is_sorted(priorities in prop::collection::vec(0u64..500, 0..100)) {
            let mut index = PriorityIndex::new(HeapOrder::Ascending);
            for (key, priority) in priorities.iter().enumerate() {
                index.insert(key, *priority);
            }
            let mut last = 0u64;
            while let Ok(record) = index.pop() {
                prop_assert!(record.priority() >= last);
                last = record.priority();
            }
        }
    }
}
