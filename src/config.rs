//! Engine construction parameters.
//!
//! | Field            | Type              | Default | Description                         |
//! |------------------|-------------------|---------|-------------------------------------|
//! | `capacity`       | `usize`           | 16      | Maximum entries in the primary map  |
//! | `policy`         | `PolicyKind`      | LFU     | Eviction policy                     |
//! | `secondary_path` | `Option<PathBuf>` | `None`  | File backing the secondary tier     |
//!
//! A configuration is consumed once at construction; an engine never changes
//! its capacity or policy afterwards.
//!
//! ```
//! use tiercache::config::{DEFAULT_CAPACITY, EngineConfig};
//! use tiercache::policy::PolicyKind;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.capacity, DEFAULT_CAPACITY);
//! assert_eq!(config.policy, PolicyKind::Lfu);
//! assert!(config.secondary_path.is_none());
//! ```

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::policy::PolicyKind;

/// Primary capacity used when none is given.
pub const DEFAULT_CAPACITY: usize = 16;

/// Immutable engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of entries in the primary map. Must be positive.
    pub capacity: usize,
    /// Eviction policy.
    pub policy: PolicyKind,
    /// File backing the secondary tier; `None` disables the tier.
    ///
    /// Opened by [`CacheEngine::new`](crate::engine::CacheEngine::new) and
    /// [`CacheBuilder::from_config`](crate::builder::CacheBuilder::from_config).
    /// [`CacheEngine::with_parts`](crate::engine::CacheEngine::with_parts)
    /// takes its store directly and does not open this path.
    pub secondary_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Checks that the configuration can build an engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: PolicyKind::default(),
            secondary_path: None,
        }
    }
}
