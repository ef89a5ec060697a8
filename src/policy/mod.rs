//! Eviction policies.
//!
//! Every policy owns a [`PriorityIndex`] and answers the same questions: what
//! rank does a new entry get, how does a read change it, which entry leaves
//! next, and is a freshly read entry hot enough for the secondary tier.
//!
//! | Policy | Priority        | On read          | Evicts          |
//! |--------|-----------------|------------------|-----------------|
//! | LFU    | use count       | count + 1        | smallest count  |
//! | MFU    | use count       | count + 1        | largest count   |
//! | LRU    | last-access ms  | now              | oldest access   |
//!
//! [`Policy`] is the closed set of variants the engine dispatches over.

pub mod admission;
pub mod frequency;
pub mod lru;

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::ds::{HeapOrder, Priority, PriorityIndex};
use crate::error::{ConfigError, PolicyError};

use frequency::FrequencyPolicy;
use lru::LruPolicy;

/// Which eviction policy an engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Least Frequently Used.
    #[default]
    Lfu,
    /// Most Frequently Used (LFU with the ordering inverted).
    Mfu,
    /// Least Recently Used.
    Lru,
}

impl PolicyKind {
    /// All variants, in declaration order.
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Lfu, PolicyKind::Mfu, PolicyKind::Lru];

    /// Upper-case short name.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Lfu => "LFU",
            PolicyKind::Mfu => "MFU",
            PolicyKind::Lru => "LRU",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    /// Parses `lfu`, `mfu` or `lru`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::new(format!("unknown eviction policy {name:?}")))
    }
}

/// Outcome of re-ranking an entry on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touched<P> {
    /// The entry's new priority.
    pub priority: P,
    /// Whether the new priority is at or above the index mean.
    pub hot: bool,
}

/// A policy-neutral view of an entry's priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    /// Use count under LFU or MFU.
    Uses(u64),
    /// Last access time under LRU.
    LastAccess(Timestamp),
}

impl Rank {
    /// Returns the use count, if this is a frequency rank.
    pub fn uses(self) -> Option<u64> {
        match self {
            Rank::Uses(uses) => Some(uses),
            Rank::LastAccess(_) => None,
        }
    }

    /// Returns the last access time, if this is a recency rank.
    pub fn last_access(self) -> Option<Timestamp> {
        match self {
            Rank::LastAccess(at) => Some(at),
            Rank::Uses(_) => None,
        }
    }
}

/// Capability set shared by all eviction policies.
///
/// A policy tracks exactly the keys the engine holds in its primary map. The
/// engine calls [`add_entry`](Self::add_entry) once per new key,
/// [`touch`](Self::touch) on every hit, and [`evict`](Self::evict) when the
/// primary map is full.
pub trait EvictionPolicy<K> {
    /// Rank value stored in the index.
    type Priority: Priority;

    /// Which variant this is.
    fn kind(&self) -> PolicyKind;

    /// Starts tracking `key` with the policy's initial priority.
    fn add_entry(&mut self, key: K);

    /// Re-ranks `key` after a read and evaluates it for the secondary tier.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] if `key` is not tracked.
    fn touch(&mut self, key: &K) -> Result<Touched<Self::Priority>, PolicyError>;

    /// The key that would be evicted next.
    fn eviction_candidate(&self) -> Option<&K>;

    /// Stops tracking the lowest-ranked key and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyIndex`] if nothing is tracked.
    fn evict(&mut self) -> Result<K, PolicyError>;

    /// Stops tracking `key`, returning its last priority.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] if `key` is not tracked.
    fn remove(&mut self, key: &K) -> Result<Self::Priority, PolicyError>;

    /// Current priority of `key`.
    fn priority_of(&self, key: &K) -> Option<Self::Priority>;

    /// Whether `key` is tracked.
    fn contains(&self, key: &K) -> bool;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    /// Whether nothing is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops tracking every key.
    fn clear(&mut self);
}

/// Remove-compute-reinsert, then apply the mean test to the new priority.
pub(crate) fn rerank<K, P, F>(
    index: &mut PriorityIndex<K, P>,
    key: &K,
    next: F,
) -> Result<Touched<P>, PolicyError>
where
    K: Eq + Hash + Clone,
    P: Priority,
    F: FnOnce(P) -> P,
{
    let (key, current) = index.remove(key)?.into_parts();
    let priority = next(current);
    index.insert(key, priority);
    let hot = admission::at_or_above_mean(priority, index.priority_sum(), index.len());
    Ok(Touched { priority, hot })
}

/// The closed set of policies an engine can run.
#[derive(Debug)]
pub enum Policy<K, C = SystemClock> {
    /// LFU or MFU.
    Frequency(FrequencyPolicy<K>),
    /// LRU.
    Recency(LruPolicy<K, C>),
}

impl<K, C> Policy<K, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Builds the policy for `kind`. The clock is only read by LRU.
    pub fn from_kind(kind: PolicyKind, capacity: usize, clock: C) -> Self {
        match kind {
            PolicyKind::Lfu => {
                Policy::Frequency(FrequencyPolicy::with_capacity(HeapOrder::Ascending, capacity))
            },
            PolicyKind::Mfu => {
                Policy::Frequency(FrequencyPolicy::with_capacity(HeapOrder::Descending, capacity))
            },
            PolicyKind::Lru => Policy::Recency(LruPolicy::with_capacity(clock, capacity)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Frequency(policy) => policy.kind(),
            Policy::Recency(policy) => policy.kind(),
        }
    }

    pub fn add_entry(&mut self, key: K) {
        match self {
            Policy::Frequency(policy) => policy.add_entry(key),
            Policy::Recency(policy) => policy.add_entry(key),
        }
    }

    pub fn touch(&mut self, key: &K) -> Result<Touched<Rank>, PolicyError> {
        match self {
            Policy::Frequency(policy) => policy.touch(key).map(|t| Touched {
                priority: Rank::Uses(t.priority),
                hot: t.hot,
            }),
            Policy::Recency(policy) => policy.touch(key).map(|t| Touched {
                priority: Rank::LastAccess(t.priority),
                hot: t.hot,
            }),
        }
    }

    pub fn eviction_candidate(&self) -> Option<&K> {
        match self {
            Policy::Frequency(policy) => policy.eviction_candidate(),
            Policy::Recency(policy) => policy.eviction_candidate(),
        }
    }

    pub fn evict(&mut self) -> Result<K, PolicyError> {
        match self {
            Policy::Frequency(policy) => policy.evict(),
            Policy::Recency(policy) => policy.evict(),
        }
    }

    pub fn remove(&mut self, key: &K) -> Result<Rank, PolicyError> {
        match self {
            Policy::Frequency(policy) => policy.remove(key).map(Rank::Uses),
            Policy::Recency(policy) => policy.remove(key).map(Rank::LastAccess),
        }
    }

    pub fn rank_of(&self, key: &K) -> Option<Rank> {
        match self {
            Policy::Frequency(policy) => policy.priority_of(key).map(Rank::Uses),
            Policy::Recency(policy) => policy.priority_of(key).map(Rank::LastAccess),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match self {
            Policy::Frequency(policy) => policy.contains(key),
            Policy::Recency(policy) => policy.contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Policy::Frequency(policy) => policy.len(),
            Policy::Recency(policy) => policy.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mean priority magnitude across tracked keys.
    pub fn mean_priority(&self) -> Option<f64> {
        match self {
            Policy::Frequency(policy) => admission::mean_priority(policy.index()),
            Policy::Recency(policy) => admission::mean_priority(policy.index()),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Policy::Frequency(policy) => policy.clear(),
            Policy::Recency(policy) => policy.clear(),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        match self {
            Policy::Frequency(policy) => policy.index().debug_validate_invariants(),
            Policy::Recency(policy) => policy.index().debug_validate_invariants(),
        }
    }
}
