//! Error types for the tiercache library.
//!
//! ## Key Components
//!
//! - [`PolicyError`]: Returned when a priority index or eviction policy is asked
//!   to operate on an entry it does not track (contract violations).
//! - [`StoreError`]: Returned by secondary stores when the backing medium cannot
//!   be reached or a record cannot be expressed in the line format.
//! - [`MalformedRecord`]: Describes one persisted segment that was skipped
//!   while loading the secondary tier.
//! - [`ConfigError`]: Returned when engine configuration parameters are invalid
//!   (e.g. zero capacity).
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::builder::CacheBuilder;
//! use tiercache::error::ConfigError;
//!
//! let bad = CacheBuilder::new(0).try_build::<String, String>();
//! assert!(matches!(bad, Err(ConfigError { .. })));
//! ```

use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// PolicyError
// ---------------------------------------------------------------------------

/// Error returned by [`PriorityIndex`](crate::ds::PriorityIndex) and eviction
/// policies.
///
/// Both variants indicate that the primary map and the policy index disagree
/// about which keys are cached. The engine propagates them instead of
/// repairing state, so they always point at a bug in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// An eviction was requested while the index held no records.
    #[error("priority index is empty")]
    EmptyIndex,
    /// The key is not tracked by the priority index.
    #[error("key is not tracked by the priority index")]
    NotFound,
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Error returned by [`SecondaryStore`](crate::store::SecondaryStore)
/// implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium could not be opened, read or written.
    ///
    /// The engine reacts by dropping the secondary tier and continuing in
    /// primary-only mode.
    #[error("secondary store unavailable: {0}")]
    Unavailable(#[from] io::Error),
    /// The key or value contains a separator the line format cannot carry.
    #[error("record cannot be stored: {0}")]
    UnsupportedRecord(String),
}

impl StoreError {
    /// Returns `true` if the store itself failed, as opposed to one record.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

// ---------------------------------------------------------------------------
// MalformedRecord
// ---------------------------------------------------------------------------

/// A persisted segment that could not be turned into a `(key, value)` pair.
///
/// Loading never fails because of malformed segments; they are counted,
/// logged, and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed persisted record {segment:?}: {reason}")]
pub struct MalformedRecord {
    /// The raw text of the offending segment.
    pub segment: String,
    /// Why the segment was rejected.
    pub reason: &'static str,
}

impl MalformedRecord {
    pub(crate) fn new(segment: impl Into<String>, reason: &'static str) -> Self {
        Self {
            segment: segment.into(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when engine configuration parameters are invalid.
///
/// Produced by [`EngineConfig::validate`](crate::config::EngineConfig::validate)
/// and builder `try_build()` methods. Carries a human-readable description of
/// which parameter failed validation.
///
/// # Example
///
/// ```
/// use tiercache::config::EngineConfig;
///
/// let config = EngineConfig { capacity: 0, ..EngineConfig::default() };
/// let err = config.validate().unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- PolicyError ------------------------------------------------------

    #[test]
    fn policy_display_names_the_condition() {
        assert_eq!(PolicyError::EmptyIndex.to_string(), "priority index is empty");
        assert!(PolicyError::NotFound.to_string().contains("not tracked"));
    }

    #[test]
    fn policy_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PolicyError>();
    }

    // -- StoreError -------------------------------------------------------

    #[test]
    fn store_io_error_converts_to_unavailable() {
        let err: StoreError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn store_unsupported_record_is_not_unavailable() {
        let err = StoreError::UnsupportedRecord("key contains ';'".into());
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("';'"));
    }

    // -- MalformedRecord --------------------------------------------------

    #[test]
    fn malformed_display_includes_segment_and_reason() {
        let err = MalformedRecord::new("novalue", "missing ':'");
        let text = err.to_string();
        assert!(text.contains("novalue"));
        assert!(text.contains("missing ':'"));
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
