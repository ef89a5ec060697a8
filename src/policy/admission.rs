//! Mean-priority admission test for the secondary tier.
//!
//! After an entry is re-ranked, it is considered worth persisting when its
//! priority is at or above the arithmetic mean of every priority currently in
//! the index. The comparison is done exactly in integer arithmetic:
//!
//! ```text
//!   priority >= sum / len   ⇔   priority * len >= sum
//! ```
//!
//! This is a coarse popularity filter, not a top-K selector. It drifts with
//! the distribution: an entry rejected now can pass later once other entries
//! cool down, and LRU timestamps, being the newest value in the index right
//! after a touch, always pass.

use std::hash::Hash;

use crate::ds::{Priority, PriorityIndex};

/// Returns `true` if `priority` is at or above the mean of `len` priorities
/// summing to `priority_sum`. An empty population admits nothing.
#[inline]
pub fn at_or_above_mean<P: Priority>(priority: P, priority_sum: u128, len: usize) -> bool {
    if len == 0 {
        return false;
    }
    priority.magnitude().saturating_mul(len as u128) >= priority_sum
}

/// Mean priority magnitude, for diagnostics.
pub fn mean_priority<K, P>(index: &PriorityIndex<K, P>) -> Option<f64>
where
    K: Eq + Hash + Clone,
    P: Priority,
{
    if index.is_empty() {
        return None;
    }
    Some(index.priority_sum() as f64 / index.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::HeapOrder;

    #[test]
    fn empty_population_admits_nothing() {
        assert!(!at_or_above_mean(10u64, 0, 0));
    }

    #[test]
    fn equal_to_mean_is_admitted() {
        // mean of {2, 2} is 2
        assert!(at_or_above_mean(2u64, 4, 2));
    }

    #[test]
    fn below_fractional_mean_is_rejected() {
        // mean of {4, 2, 1} is 2.33
        assert!(!at_or_above_mean(2u64, 7, 3));
        assert!(at_or_above_mean(3u64, 7, 3));
    }

    #[test]
    fn single_record_is_its_own_mean() {
        let mut index = PriorityIndex::new(HeapOrder::Descending);
        index.insert("only", 1u64);
        assert!(at_or_above_mean(1u64, index.priority_sum(), index.len()));
        assert_eq!(mean_priority(&index), Some(1.0));
    }

    #[test]
    fn mean_priority_of_empty_index_is_none() {
        let index: PriorityIndex<&str, u64> = PriorityIndex::new(HeapOrder::Ascending);
        assert_eq!(mean_priority(&index), None);
    }
}
