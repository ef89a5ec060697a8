//! Secondary-tier handle and the persisted-key set.
//!
//! [`SecondaryTier`] pairs a boxed [`SecondaryStore`] with the set of keys
//! already written to it. A key is persisted at most once over the tier's
//! lifetime: membership is checked before writing and recorded only after the
//! store accepts the record. The set survives [`CacheEngine::clear`] and store
//! failures.
//!
//! When the store reports [`StoreError::Unavailable`] the tier drops it and
//! stays in degraded mode: nothing further is written or read, and the
//! engine keeps serving from the primary map.
//!
//! [`CacheEngine::clear`]: crate::engine::CacheEngine::clear

use std::fmt::{self, Display};
use std::hash::Hash;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::SecondaryStore;
use crate::store::line_format::Decoded;

/// What happened when an entry was offered to the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The record was written.
    Written,
    /// The key had already been persisted; nothing was written.
    AlreadyPersisted,
    /// The record cannot be expressed in the line format.
    Rejected,
    /// The store is unavailable; the tier is now degraded.
    Unavailable,
}

/// Optional store plus the keys it already holds.
pub struct SecondaryTier<K> {
    store: Option<Box<dyn SecondaryStore>>,
    persisted: FxHashSet<K>,
}

impl<K> SecondaryTier<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Wraps `store`.
    pub fn new(store: Box<dyn SecondaryStore>) -> Self {
        Self {
            store: Some(store),
            persisted: FxHashSet::default(),
        }
    }

    /// `false` once the store has failed.
    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Whether `key` has been written or loaded.
    pub fn is_persisted(&self, key: &K) -> bool {
        self.persisted.contains(key)
    }

    /// Records `key` as already present in the store.
    pub fn mark_persisted(&mut self, key: K) {
        self.persisted.insert(key);
    }

    /// Reads every record from the store.
    ///
    /// A read failure degrades the tier and yields nothing.
    pub fn load(&mut self) -> Decoded {
        let Some(store) = self.store.as_mut() else {
            return Decoded::default();
        };
        match store.load_all() {
            Ok(decoded) => decoded,
            Err(err) => {
                self.degrade(&err);
                Decoded::default()
            },
        }
    }

    /// Writes `(key, value)` unless `key` was persisted before.
    pub fn persist<V: Display>(&mut self, key: &K, value: &V) -> PersistOutcome {
        if self.persisted.contains(key) {
            return PersistOutcome::AlreadyPersisted;
        }
        let Some(store) = self.store.as_mut() else {
            return PersistOutcome::Unavailable;
        };
        match store.append(&key.to_string(), &value.to_string()) {
            Ok(()) => {
                debug!(key = %key, "persisted entry to secondary tier");
                self.persisted.insert(key.clone());
                PersistOutcome::Written
            },
            Err(err) if err.is_unavailable() => {
                self.degrade(&err);
                PersistOutcome::Unavailable
            },
            Err(err) => {
                warn!(key = %key, error = %err, "secondary tier rejected entry");
                PersistOutcome::Rejected
            },
        }
    }

    fn degrade(&mut self, err: &StoreError) {
        warn!(error = %err, "secondary tier disabled; continuing with primary tier only");
        self.store = None;
    }
}

impl<K> fmt::Debug for SecondaryTier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryTier")
            .field("available", &self.store.is_some())
            .field("persisted", &self.persisted.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tier() -> (SecondaryTier<String>, MemoryStore) {
        let store = MemoryStore::new();
        (SecondaryTier::new(Box::new(store.clone())), store)
    }

    #[test]
    fn persists_each_key_once() {
        let (mut tier, store) = tier();
        let key = "a".to_string();
        assert_eq!(tier.persist(&key, &1), PersistOutcome::Written);
        assert_eq!(tier.persist(&key, &2), PersistOutcome::AlreadyPersisted);
        assert_eq!(store.contents(), "a:1;");
        assert!(tier.is_persisted(&key));
    }

    #[test]
    fn marked_keys_are_never_written() {
        let (mut tier, store) = tier();
        tier.mark_persisted("warm".to_string());
        assert_eq!(tier.persist(&"warm".to_string(), &"v"), PersistOutcome::AlreadyPersisted);
        assert_eq!(store.append_count(), 0);
    }

    #[test]
    fn rejected_record_is_not_marked() {
        let (mut tier, _store) = tier();
        let key = "k".to_string();
        assert_eq!(tier.persist(&key, &"a;b"), PersistOutcome::Rejected);
        assert!(!tier.is_persisted(&key));
        assert!(tier.is_available());
    }

    #[test]
    fn write_failure_degrades_tier() {
        let (mut tier, store) = tier();
        store.set_unavailable(true);
        assert_eq!(tier.persist(&"a".to_string(), &1), PersistOutcome::Unavailable);
        assert!(!tier.is_available());

        store.set_unavailable(false);
        assert_eq!(tier.persist(&"b".to_string(), &1), PersistOutcome::Unavailable);
        assert_eq!(store.append_count(), 0);
    }

    #[test]
    fn load_failure_degrades_tier() {
        let (mut tier, store) = tier();
        store.set_unavailable(true);
        assert_eq!(tier.load(), Decoded::default());
        assert!(!tier.is_available());
    }
}
