//! Wall-clock timestamps.
//!
//! [`Timestamp`] wraps a `u64` of nanoseconds since the Unix epoch. Unlike a
//! monotonic clock reading it is meaningful across processes, which matters
//! because market-data freshness is reported by an external feed and shown
//! on status endpoints.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time.
    ///
    /// A clock set before the epoch reads as `Timestamp(0)`.
    #[inline]
    pub fn now() -> Self {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(dur.as_nanos() as u64)
    }

    /// Create a timestamp from milliseconds since the epoch.
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000_000)
    }

    /// Convert to milliseconds since the epoch.
    #[inline]
    pub const fn to_millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Returns the raw nanosecond value.
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// A timestamp `dur` before `self`, saturating at the epoch.
    #[inline]
    pub fn saturating_sub(&self, dur: Duration) -> Self {
        Self(self.0.saturating_sub(dur.as_nanos() as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / 1_000_000_000;
        let nanos = self.0 % 1_000_000_000;
        write!(f, "{}.{:09}", secs, nanos)
    }
}
