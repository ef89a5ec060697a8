//! tiercache: a bounded key-value cache with pluggable LFU, MFU and LRU
//! eviction and an optional append-only secondary tier.
//!
//! See `DESIGN.md` for the internal architecture and invariants.

pub mod builder;
pub mod clock;
pub mod config;
pub mod ds;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod store;
pub mod tier;

pub use crate::builder::CacheBuilder;
pub use crate::engine::CacheEngine;
pub use crate::error::{ConfigError, PolicyError, StoreError};
pub use crate::policy::PolicyKind;
