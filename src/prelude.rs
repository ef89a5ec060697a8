pub use crate::builder::CacheBuilder;
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::config::EngineConfig;
pub use crate::engine::CacheEngine;
pub use crate::error::{ConfigError, PolicyError, StoreError};
pub use crate::metrics::EngineMetrics;
pub use crate::policy::{EvictionPolicy, Policy, PolicyKind, Rank, Touched};
pub use crate::store::{FileStore, MemoryStore, SecondaryStore};
