//! # Two-Tier Cache Engine
//!
//! [`CacheEngine`] owns a bounded primary map, exactly one eviction
//! [`Policy`], and an optional [`SecondaryTier`]. It is the only type
//! application code needs to talk to.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                        CacheEngine<K, V, C>                              │
//!   │                                                                          │
//!   │   primary: FxHashMap<K, V>        policy: Policy<K, C>                   │
//!   │   ┌──────────────────────┐        ┌──────────────────────────────────┐   │
//!   │   │ "Cache1" → "1"       │ ←────→ │ PriorityIndex (one record / key) │   │
//!   │   │ "Cache2" → "2"       │  size  │ eviction_candidate() = root      │   │
//!   │   └──────────────────────┘  sync  └──────────────────────────────────┘   │
//!   │                                                                          │
//!   │   tier: Option<SecondaryTier<K>>                                         │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │ store: Box<dyn SecondaryStore>   persisted: FxHashSet<K>         │   │
//!   │   └──────────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! ```text
//!   put(k, v)
//!     k present      → overwrite value, rank unchanged
//!     k new, full    → evict policy.eviction_candidate(), then insert
//!     k new, room    → insert, policy.add_entry(k)
//!
//!   get(k)
//!     miss           → Ok(None)
//!     hit            → policy.touch(k) → hot? → tier.persist(k, v) (once per key)
//! ```
//!
//! ## Warm Start
//!
//! When a secondary tier is present at construction, every stored record is
//! read back. Records are inserted in store order until the primary map is
//! full; every loaded key is marked as persisted whether or not it fit.
//! Segments the line format rejects, and records whose key or value fail to
//! parse, are skipped and counted in [`EngineMetrics::malformed_skipped`].
//!
//! ## Failure Model
//!
//! - Secondary-tier failures never fail a `put` or `get`; the tier degrades and
//!   the engine keeps serving from the primary map.
//! - [`PolicyError`] from `put`/`get` means the primary map and the policy
//!   index disagree. That is a bug in the engine, not a recoverable state.
//!
//! ## Thread Safety
//!
//! Single-threaded. Every operation takes `&mut self` and runs to completion.

use std::fmt::{self, Display};
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{ConfigError, PolicyError};
use crate::metrics::EngineMetrics;
use crate::policy::{Policy, PolicyKind, Rank};
use crate::store::{FileStore, SecondaryStore};
use crate::tier::{PersistOutcome, SecondaryTier};

/// Bounded key-value cache with a pluggable eviction policy and an optional
/// append-only secondary tier.
///
/// Keys and values cross the secondary tier as text, so keys are `Display`
/// and `FromStr`, and so are values.
///
/// # Example
///
/// ```
/// use tiercache::config::EngineConfig;
/// use tiercache::engine::CacheEngine;
/// use tiercache::policy::PolicyKind;
///
/// let config = EngineConfig { capacity: 2, policy: PolicyKind::Lfu, ..EngineConfig::default() };
/// let mut cache: CacheEngine<String, u32> = CacheEngine::new(&config).unwrap();
///
/// cache.put("a".to_string(), 1).unwrap();
/// cache.put("b".to_string(), 2).unwrap();
/// assert_eq!(cache.get(&"a".to_string()).unwrap(), Some(&1));
///
/// // "b" has the lowest use count, so it makes room for "c".
/// cache.put("c".to_string(), 3).unwrap();
/// assert!(!cache.contains(&"b".to_string()));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct CacheEngine<K, V, C = SystemClock> {
    primary: FxHashMap<K, V>,
    capacity: usize,
    policy: Policy<K, C>,
    tier: Option<SecondaryTier<K>>,
    metrics: EngineMetrics,
}

impl<K, V> CacheEngine<K, V, SystemClock>
where
    K: Eq + Hash + Clone + Display + FromStr,
    V: Display + FromStr,
{
    /// Builds an engine on the wall clock.
    ///
    /// If `config.secondary_path` is set the file is opened (and created if
    /// missing). A file that cannot be opened is logged and the engine runs
    /// without a secondary tier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let store = config.secondary_path.as_deref().and_then(open_secondary);
        Self::assemble(config, SystemClock, store)
    }
}

impl<K, V, C> CacheEngine<K, V, C>
where
    K: Eq + Hash + Clone + Display + FromStr,
    V: Display + FromStr,
    C: Clock,
{
    /// Builds an engine from its parts.
    ///
    /// `store` is used as the secondary tier when present and warm-start
    /// records are loaded from it. `config.secondary_path` is not opened; a
    /// path set there is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn with_parts(
        config: &EngineConfig,
        clock: C,
        store: Option<Box<dyn SecondaryStore>>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = &config.secondary_path {
            debug!(
                path = %path.display(),
                store_supplied = store.is_some(),
                "secondary_path is not opened by with_parts"
            );
        }
        Self::assemble(config, clock, store)
    }

    fn assemble(
        config: &EngineConfig,
        clock: C,
        store: Option<Box<dyn SecondaryStore>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self {
            primary: FxHashMap::with_capacity_and_hasher(config.capacity, Default::default()),
            capacity: config.capacity,
            policy: Policy::from_kind(config.policy, config.capacity, clock),
            tier: store.map(SecondaryTier::new),
            metrics: EngineMetrics::default(),
        };
        engine.warm_start();
        info!(
            capacity = engine.capacity,
            policy = %engine.policy.kind(),
            secondary = engine.secondary_enabled(),
            loaded = engine.primary.len(),
            "cache engine ready"
        );
        Ok(engine)
    }

    fn warm_start(&mut self) {
        let Some(tier) = self.tier.as_mut() else {
            return;
        };
        let decoded = tier.load();
        for malformed in &decoded.malformed {
            warn!(error = %malformed, "skipping persisted record");
            self.metrics.malformed_skipped += 1;
        }
        for (raw_key, raw_value) in decoded.records {
            let (Ok(key), Ok(value)) = (raw_key.parse::<K>(), raw_value.parse::<V>()) else {
                warn!(key = %raw_key, "skipping persisted record that does not parse");
                self.metrics.malformed_skipped += 1;
                continue;
            };
            self.metrics.secondary_loaded += 1;
            tier.mark_persisted(key.clone());

            if let Some(slot) = self.primary.get_mut(&key) {
                *slot = value;
            } else if self.primary.len() < self.capacity {
                self.policy.add_entry(key.clone());
                self.primary.insert(key, value);
            }
        }
    }
}

impl<K, V, C> CacheEngine<K, V, C>
where
    K: Eq + Hash + Clone + Display,
    V: Display,
    C: Clock,
{
    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// Adding a new key to a full map first evicts the policy's candidate.
    /// Overwriting leaves the entry's rank untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the policy index is out of sync with the
    /// primary map.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>, PolicyError> {
        if let Some(slot) = self.primary.get_mut(&key) {
            self.metrics.updates += 1;
            debug!(key = %key, "updated entry");
            return Ok(Some(std::mem::replace(slot, value)));
        }

        if self.primary.len() >= self.capacity {
            let victim = self.policy.evict()?;
            if self.primary.remove(&victim).is_none() {
                return Err(PolicyError::NotFound);
            }
            self.metrics.evictions += 1;
            debug!(victim = %victim, incoming = %key, "evicted entry");
        }

        self.policy.add_entry(key.clone());
        self.primary.insert(key, value);
        self.metrics.inserts += 1;
        Ok(None)
    }

    /// Reads `key`, re-ranking it and offering it to the secondary tier.
    ///
    /// A miss is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] if the key is in the primary map but
    /// not tracked by the policy.
    pub fn get(&mut self, key: &K) -> Result<Option<&V>, PolicyError> {
        let Some(value) = self.primary.get(key) else {
            self.metrics.misses += 1;
            return Ok(None);
        };
        self.metrics.hits += 1;

        let touched = self.policy.touch(key)?;
        if touched.hot
            && let Some(tier) = self.tier.as_mut()
        {
            match tier.persist(key, value) {
                PersistOutcome::Written => self.metrics.secondary_writes += 1,
                PersistOutcome::AlreadyPersisted => {},
                PersistOutcome::Rejected | PersistOutcome::Unavailable => {
                    self.metrics.secondary_failures += 1;
                },
            }
        }
        Ok(Some(value))
    }

    /// Reads `key` without touching its rank or the secondary tier.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.primary.get(key)
    }

    /// Whether `key` is in the primary map.
    pub fn contains(&self, key: &K) -> bool {
        self.primary.contains_key(key)
    }

    /// Empties the primary map and the policy index.
    ///
    /// Keys already written to the secondary tier stay marked as persisted.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.policy.clear();
    }

    /// The key the next overflowing `put` would evict.
    pub fn eviction_candidate(&self) -> Option<&K> {
        self.policy.eviction_candidate()
    }

    /// Current rank of `key` under the active policy.
    pub fn rank_of(&self, key: &K) -> Option<Rank> {
        self.policy.rank_of(key)
    }

    /// Whether `key` has been written to (or loaded from) the secondary tier.
    pub fn is_persisted(&self, key: &K) -> bool {
        self.tier.as_ref().is_some_and(|tier| tier.is_persisted(key))
    }

    /// Whether a working secondary tier is attached.
    pub fn secondary_enabled(&self) -> bool {
        self.tier.as_ref().is_some_and(SecondaryTier::is_available)
    }

    /// Mean priority magnitude across cached entries.
    pub fn mean_priority(&self) -> Option<f64> {
        self.policy.mean_priority()
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        assert!(self.primary.len() <= self.capacity);
        assert_eq!(self.primary.len(), self.policy.len());
        for key in self.primary.keys() {
            assert!(self.policy.contains(key), "primary key {key} not ranked");
        }
        self.policy.debug_validate_invariants();
    }
}

impl<K, V, C> CacheEngine<K, V, C> {
    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    /// Whether the primary map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Maximum number of cached entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics
    }
}

impl<K, V, C> CacheEngine<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// The policy this engine was built with.
    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }
}

impl<K, V, C> fmt::Debug for CacheEngine<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("capacity", &self.capacity)
            .field("len", &self.primary.len())
            .field("policy", &self.policy.kind())
            .field("tier", &self.tier)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Opens the file store at `path`, logging and returning `None` on failure.
pub(crate) fn open_secondary(path: &Path) -> Option<Box<dyn SecondaryStore>> {
    match FileStore::open(path) {
        Ok(store) => Some(Box::new(store)),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "secondary tier unavailable; running primary-only"
            );
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn config(capacity: usize, policy: PolicyKind) -> EngineConfig {
        EngineConfig {
            capacity,
            policy,
            secondary_path: None,
        }
    }

    fn engine(
        capacity: usize,
        policy: PolicyKind,
        store: Option<MemoryStore>,
    ) -> CacheEngine<String, String, ManualClock> {
        let store = store.map(|s| Box::new(s) as Box<dyn SecondaryStore>);
        CacheEngine::with_parts(&config(capacity, policy), ManualClock::ticking(0, 1), store)
            .unwrap()
    }

    fn s(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result: Result<CacheEngine<String, String>, _> =
            CacheEngine::new(&config(0, PolicyKind::Lfu));
        assert!(result.is_err());
    }

    #[test]
    fn put_overwrites_without_eviction() {
        let mut cache = engine(2, PolicyKind::Lfu, None);
        assert_eq!(cache.put(s("a"), s("1")).unwrap(), None);
        assert_eq!(cache.put(s("b"), s("2")).unwrap(), None);
        assert_eq!(cache.put(s("a"), s("3")).unwrap(), Some(s("1")));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&s("a")), Some(&s("3")));
        assert_eq!(cache.rank_of(&s("a")), Some(Rank::Uses(1)));
        assert_eq!(cache.metrics().updates, 1);
        assert_eq!(cache.metrics().evictions, 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn miss_is_not_an_error() {
        let mut cache = engine(2, PolicyKind::Lru, None);
        assert_eq!(cache.get(&s("absent")).unwrap(), None);
        assert_eq!(cache.metrics().misses, 1);
        assert_eq!(cache.metrics().hit_ratio(), Some(0.0));
    }

    #[test]
    fn peek_does_not_rerank() {
        let mut cache = engine(2, PolicyKind::Lfu, None);
        cache.put(s("a"), s("1")).unwrap();
        cache.put(s("b"), s("2")).unwrap();
        cache.get(&s("b")).unwrap();
        assert_eq!(cache.peek(&s("a")), Some(&s("1")));
        assert_eq!(cache.eviction_candidate(), Some(&s("a")));
        assert_eq!(cache.rank_of(&s("a")), Some(Rank::Uses(1)));
    }

    #[test]
    fn overflow_evicts_candidate() {
        let mut cache = engine(2, PolicyKind::Lfu, None);
        cache.put(s("a"), s("1")).unwrap();
        cache.put(s("b"), s("2")).unwrap();
        cache.get(&s("a")).unwrap();
        assert_eq!(cache.eviction_candidate(), Some(&s("b")));

        cache.put(s("c"), s("3")).unwrap();
        assert!(!cache.contains(&s("b")));
        assert!(cache.contains(&s("a")));
        assert!(cache.contains(&s("c")));
        assert_eq!(cache.metrics().evictions, 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn hot_read_is_persisted_once() {
        let store = MemoryStore::new();
        let mut cache = engine(4, PolicyKind::Lfu, Some(store.clone()));
        cache.put(s("a"), s("1")).unwrap();
        cache.get(&s("a")).unwrap();
        cache.get(&s("a")).unwrap();

        assert_eq!(store.contents(), "a:1;");
        assert!(cache.is_persisted(&s("a")));
        assert_eq!(cache.metrics().secondary_writes, 1);
    }

    #[test]
    fn warm_start_fills_up_to_capacity_and_marks_all_keys() {
        let store = MemoryStore::with_contents("a:1;b:2;c:3;");
        let mut cache = engine(2, PolicyKind::Lfu, Some(store.clone()));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&s("a")));
        assert!(cache.contains(&s("b")));
        assert!(!cache.contains(&s("c")));
        assert!(cache.is_persisted(&s("c")));
        assert_eq!(cache.metrics().secondary_loaded, 3);

        cache.get(&s("a")).unwrap();
        assert_eq!(store.append_count(), 0);
        cache.debug_validate_invariants();
    }

    #[test]
    fn warm_start_skips_values_that_do_not_parse() {
        let store: Box<dyn SecondaryStore> = Box::new(MemoryStore::with_contents("a:1;b:x;"));
        let cache: CacheEngine<String, u32, _> = CacheEngine::with_parts(
            &config(4, PolicyKind::Mfu),
            ManualClock::new(0),
            Some(store),
        )
        .unwrap();

        assert_eq!(cache.peek(&s("a")), Some(&1));
        assert!(!cache.contains(&s("b")));
        assert!(!cache.is_persisted(&s("b")));
        assert_eq!(cache.metrics().malformed_skipped, 1);
    }

    #[test]
    fn store_failure_degrades_but_reads_succeed() {
        let store = MemoryStore::new();
        let mut cache = engine(2, PolicyKind::Lfu, Some(store.clone()));
        cache.put(s("a"), s("1")).unwrap();
        store.set_unavailable(true);

        assert_eq!(cache.get(&s("a")).unwrap(), Some(&s("1")));
        assert!(!cache.secondary_enabled());
        assert!(!cache.is_persisted(&s("a")));
        assert_eq!(cache.metrics().secondary_failures, 1);
    }

    #[test]
    fn clear_keeps_persisted_keys() {
        let store = MemoryStore::new();
        let mut cache = engine(2, PolicyKind::Lfu, Some(store.clone()));
        cache.put(s("a"), s("1")).unwrap();
        cache.get(&s("a")).unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.eviction_candidate(), None);
        assert!(cache.is_persisted(&s("a")));

        cache.put(s("a"), s("2")).unwrap();
        cache.get(&s("a")).unwrap();
        assert_eq!(store.append_count(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn unopenable_path_runs_primary_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            secondary_path: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };
        let mut cache: CacheEngine<String, String> = CacheEngine::new(&config).unwrap();
        assert!(!cache.secondary_enabled());
        cache.put(s("a"), s("1")).unwrap();
        assert_eq!(cache.get(&s("a")).unwrap(), Some(&s("1")));
    }

    #[test]
    fn with_parts_does_not_open_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("l2.txt");
        let config = EngineConfig {
            secondary_path: Some(path.clone()),
            ..config(2, PolicyKind::Lfu)
        };
        let cache: CacheEngine<String, String, _> =
            CacheEngine::with_parts(&config, ManualClock::new(0), None).unwrap();
        assert!(!cache.secondary_enabled());
        assert!(!path.exists());
    }

    #[test]
    fn warm_start_counts_undecodable_segments() {
        let store = MemoryStore::with_contents("a:1;garbage;b:tru");
        let cache = engine(4, PolicyKind::Lfu, Some(store));
        assert_eq!(cache.metrics().malformed_skipped, 2);
        assert_eq!(cache.metrics().secondary_loaded, 1);
        assert!(cache.contains(&s("a")));
        assert!(!cache.contains(&s("b")));
    }

    #[test]
    fn debug_output_names_policy() {
        let cache = engine(3, PolicyKind::Mfu, None);
        let rendered = format!("{cache:?}");
        assert!(rendered.contains("Mfu"));
        assert_eq!(cache.policy_kind(), PolicyKind::Mfu);
        assert_eq!(cache.capacity(), 3);
    }
}
