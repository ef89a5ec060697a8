//! Time sources for recency-ranked policies.
//!
//! The LRU policy ranks entries by the millisecond timestamp of their last
//! access. Timestamps come from a [`Clock`] so that tests and simulations can
//! drive time explicitly instead of depending on wall-clock resolution.
//!
//! ## Key Components
//!
//! - [`Timestamp`]: milliseconds since the Unix epoch.
//! - [`SystemClock`]: wall-clock time via `chrono::Utc`.
//! - [`ManualClock`]: shared, explicitly advanced clock for deterministic runs.
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::clock::{Clock, ManualClock, Timestamp};
//!
//! let clock = ManualClock::new(100);
//! let handle = clock.clone();
//!
//! assert_eq!(clock.now(), Timestamp::from_millis(100));
//! handle.advance(5);
//! assert_eq!(clock.now(), Timestamp::from_millis(105));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::ds::Priority;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as epoch milliseconds.
    #[inline]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl Priority for Timestamp {
    #[inline]
    fn magnitude(self) -> u128 {
        u128::from(self.0)
    }
}

/// Source of access timestamps.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch clocks clamp to zero.
        let millis = Utc::now().timestamp_millis().max(0);
        Timestamp(millis as u64)
    }
}

/// Explicitly driven clock.
///
/// Clones share the same underlying time, so a test can keep a handle and
/// advance the clock that an engine reads from. An optional auto-advance step
/// is added after every [`now`](Clock::now) read, which gives every access a
/// distinct timestamp without manual bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
    step: u64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_millis`.
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start_millis)),
            step: 0,
        }
    }

    /// Creates a clock that moves forward by `step_millis` after every read.
    pub fn ticking(start_millis: u64, step_millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start_millis)),
            step: step_millis,
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::Relaxed);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }

    /// Returns the current time without applying the auto-advance step.
    pub fn current(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::Relaxed))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.fetch_add(self.step, Ordering::Relaxed))
    }
}
