//! # Frequency-Ranked Policies (LFU and MFU)
//!
//! One counting rule, two orderings. Every entry starts with a use count of 1
//! and gains 1 per read; the count never resets while the entry is cached.
//! LFU evicts the smallest count, MFU the largest. MFU is LFU with the
//! priority comparison inverted, nothing more.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                        FrequencyPolicy<K>                                │
//!   │                                                                          │
//!   │   index: PriorityIndex<K, u64>                                           │
//!   │                                                                          │
//!   │     LFU (HeapOrder::Ascending)         MFU (HeapOrder::Descending)       │
//!   │     ┌───────────────────────┐          ┌───────────────────────┐         │
//!   │     │ (1, page_2) ← victim  │          │ (15, page_1) ← victim │         │
//!   │     │ (7, page_3)           │          │ (7, page_3)           │         │
//!   │     │ (15, page_1)          │          │ (1, page_2)           │         │
//!   │     └───────────────────────┘          └───────────────────────┘         │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::policy::EvictionPolicy;
//! use tiercache::policy::frequency::FrequencyPolicy;
//!
//! let mut lfu = FrequencyPolicy::lfu();
//! let mut mfu = FrequencyPolicy::mfu();
//! for policy in [&mut lfu, &mut mfu] {
//!     policy.add_entry("cold");
//!     policy.add_entry("hot");
//!     policy.touch(&"hot").unwrap();
//!     policy.touch(&"hot").unwrap();
//! }
//!
//! assert_eq!(lfu.eviction_candidate(), Some(&"cold"));
//! assert_eq!(mfu.eviction_candidate(), Some(&"hot"));
//! assert_eq!(lfu.frequency(&"hot"), Some(3));
//! ```

use std::hash::Hash;

use crate::ds::{HeapOrder, PriorityIndex};
use crate::error::PolicyError;
use crate::policy::{EvictionPolicy, PolicyKind, Touched, rerank};

/// Use count given to a freshly added entry.
pub const INITIAL_USES: u64 = 1;

/// Use-count policy; LFU or MFU depending on its [`HeapOrder`].
#[derive(Debug)]
pub struct FrequencyPolicy<K> {
    index: PriorityIndex<K, u64>,
}

impl<K> FrequencyPolicy<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a policy ranking use counts by `order`.
    pub fn new(order: HeapOrder) -> Self {
        Self::with_capacity(order, 0)
    }

    /// Creates a policy with room for `capacity` entries.
    pub fn with_capacity(order: HeapOrder, capacity: usize) -> Self {
        Self {
            index: PriorityIndex::with_capacity(order, capacity),
        }
    }

    /// Least-frequently-used: the smallest count is evicted.
    pub fn lfu() -> Self {
        Self::new(HeapOrder::Ascending)
    }

    /// Most-frequently-used: the largest count is evicted.
    pub fn mfu() -> Self {
        Self::new(HeapOrder::Descending)
    }

    /// Returns the use count for `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.index.priority_of(key)
    }

    /// Borrows the underlying index.
    pub fn index(&self) -> &PriorityIndex<K, u64> {
        &self.index
    }
}

impl<K> EvictionPolicy<K> for FrequencyPolicy<K>
where
    K: Eq + Hash + Clone,
{
    type Priority = u64;

    fn kind(&self) -> PolicyKind {
        match self.index.order() {
            HeapOrder::Ascending => PolicyKind::Lfu,
            HeapOrder::Descending => PolicyKind::Mfu,
        }
    }

    fn add_entry(&mut self, key: K) {
        self.index.insert(key, INITIAL_USES);
    }

    fn touch(&mut self, key: &K) -> Result<Touched<u64>, PolicyError> {
        rerank(&mut self.index, key, |uses| uses.saturating_add(1))
    }

    fn eviction_candidate(&self) -> Option<&K> {
        self.index.peek().map(|record| record.key())
    }

    fn evict(&mut self) -> Result<K, PolicyError> {
        self.index.pop().map(|record| record.into_key())
    }

    fn remove(&mut self, key: &K) -> Result<u64, PolicyError> {
        self.index.remove(key).map(|record| record.priority())
    }

    fn priority_of(&self, key: &K) -> Option<u64> {
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
