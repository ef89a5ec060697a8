//! Engine counters.
//!
//! Counters are plain integers updated in place; the engine is
//! single-threaded. [`CacheEngine::metrics`](crate::engine::CacheEngine::metrics)
//! returns a copy.

/// Snapshot of engine-level metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// `get` calls that found the key.
    pub hits: u64,
    /// `get` calls that did not.
    pub misses: u64,
    /// New keys added by `put`.
    pub inserts: u64,
    /// `put` calls that overwrote an existing value.
    pub updates: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Records written to the secondary tier.
    pub secondary_writes: u64,
    /// Records read from the secondary tier at construction.
    pub secondary_loaded: u64,
    /// Store failures and rejected records.
    pub secondary_failures: u64,
    /// Persisted segments skipped during warm start: undecodable segments and
    /// records whose key or value did not parse.
    pub malformed_skipped: u64,
}

impl EngineMetrics {
    /// Fraction of `get` calls that hit, or `None` before the first `get`.
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}
