//! Fluent construction of a [`CacheEngine`].
//!
//! ## Example
//!
//! ```rust
//! use tiercache::builder::CacheBuilder;
//! use tiercache::policy::PolicyKind;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut cache = CacheBuilder::new(100)
//!     .policy(PolicyKind::Mfu)
//!     .secondary_file(dir.path().join("cache_file.txt"))
//!     .try_build::<String, String>()
//!     .unwrap();
//!
//! cache.put("greeting".to_string(), "hello".to_string()).unwrap();
//! assert_eq!(cache.get(&"greeting".to_string()).unwrap(), Some(&"hello".to_string()));
//! assert!(cache.secondary_enabled());
//! ```

use std::fmt::Display;
use std::hash::Hash;
use std::path::PathBuf;
use std::str::FromStr;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::engine::{CacheEngine, open_secondary};
use crate::error::ConfigError;
use crate::policy::PolicyKind;
use crate::store::SecondaryStore;

enum Secondary {
    None,
    File(PathBuf),
    Store(Box<dyn SecondaryStore>),
}

/// Builder for [`CacheEngine`].
pub struct CacheBuilder<C = SystemClock> {
    capacity: usize,
    policy: PolicyKind,
    secondary: Secondary,
    clock: C,
}

impl CacheBuilder<SystemClock> {
    /// Create a new builder for an engine holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: PolicyKind::default(),
            secondary: Secondary::None,
            clock: SystemClock,
        }
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        let builder = Self::new(config.capacity).policy(config.policy);
        match &config.secondary_path {
            Some(path) => builder.secondary_file(path.clone()),
            None => builder,
        }
    }
}

impl<C> CacheBuilder<C> {
    /// Eviction policy. Defaults to LFU.
    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Backs the secondary tier with the file at `path`.
    pub fn secondary_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.secondary = Secondary::File(path.into());
        self
    }

    /// Backs the secondary tier with `store`.
    pub fn secondary_store(mut self, store: Box<dyn SecondaryStore>) -> Self {
        self.secondary = Secondary::Store(store);
        self
    }

    /// Replaces the time source used by LRU.
    pub fn clock<C2: Clock>(self, clock: C2) -> CacheBuilder<C2> {
        CacheBuilder {
            capacity: self.capacity,
            policy: self.policy,
            secondary: self.secondary,
            clock,
        }
    }

    /// Build the engine.
    ///
    /// A secondary file that cannot be opened is logged and the engine is
    /// built without a secondary tier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity is zero.
    pub fn try_build<K, V>(self) -> Result<CacheEngine<K, V, C>, ConfigError>
    where
        K: Eq + Hash + Clone + Display + FromStr,
        V: Display + FromStr,
        C: Clock,
    {
        let config = EngineConfig {
            capacity: self.capacity,
            policy: self.policy,
            secondary_path: None,
        };
        config.validate()?;
        let store = match self.secondary {
            Secondary::None => None,
            Secondary::File(path) => open_secondary(&path),
            Secondary::Store(store) => Some(store),
        };
        CacheEngine::with_parts(&config, self.clock, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    #[test]
    fn test_all_policies_basic_ops() {
        for policy in PolicyKind::ALL {
            let mut cache = CacheBuilder::new(10)
                .policy(policy)
                .clock(ManualClock::ticking(0, 1))
                .try_build::<u64, String>()
                .unwrap();

            assert_eq!(cache.policy_kind(), policy);
            assert_eq!(cache.put(1, "one".to_string()).unwrap(), None);
            assert_eq!(cache.put(2, "two".to_string()).unwrap(), None);

            assert_eq!(cache.get(&1).unwrap(), Some(&"one".to_string()));
            assert_eq!(cache.get(&3).unwrap(), None);
            assert!(cache.contains(&2));
            assert_eq!(cache.len(), 2);

            assert_eq!(cache.put(1, "ONE".to_string()).unwrap(), Some("one".to_string()));
            cache.clear();
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = CacheBuilder::new(0).try_build::<u64, u64>().unwrap_err();
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn test_secondary_store_is_used() {
        let store = MemoryStore::with_contents("7:seven;");
        let cache = CacheBuilder::new(4)
            .secondary_store(Box::new(store))
            .try_build::<u64, String>()
            .unwrap();
        assert!(cache.secondary_enabled());
        assert_eq!(cache.peek(&7), Some(&"seven".to_string()));
        assert!(cache.is_persisted(&7));
    }

    #[test]
    fn test_from_config_carries_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            capacity: 3,
            policy: PolicyKind::Lru,
            secondary_path: Some(dir.path().join("l2.txt")),
        };
        let cache = CacheBuilder::from_config(&config)
            .try_build::<String, String>()
            .unwrap();
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.policy_kind(), PolicyKind::Lru);
        assert!(cache.secondary_enabled());
    }
}
