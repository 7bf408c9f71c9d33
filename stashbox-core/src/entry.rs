//! The persisted cache record.
//!
//! Every cached value is stored together with the moment it was written:
//!
//! ```json
//! { "data": <value>, "timestamp": 1718000000000 }
//! ```
//!
//! `timestamp` is milliseconds since the Unix epoch. Freshness is never
//! stored; it is decided at read time by comparing the entry's age with the
//! TTL the reader passes in.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use stashbox_core::CacheEntry;
//! use std::time::Duration;
//!
//! let written = Utc.timestamp_millis_opt(1_000).unwrap();
//! let entry = CacheEntry::new(vec![1, 2, 3], written);
//!
//! let json = serde_json::to_string(&entry).unwrap();
//! assert_eq!(json, r#"{"data":[1,2,3],"timestamp":1000}"#);
//!
//! let now = Utc.timestamp_millis_opt(6_000).unwrap();
//! assert!(entry.is_fresh(Duration::from_secs(5), now));
//! assert!(!entry.is_fresh(Duration::from_millis(4_999), now));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value together with its write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    data: T,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Wraps `data` written at `written_at`.
    pub fn new(data: T, written_at: DateTime<Utc>) -> Self {
        Self {
            data,
            timestamp: written_at,
        }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the entry was written.
    #[inline]
    pub fn written_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Consumes the entry and returns the data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Age of the entry at `now`.
    ///
    /// Entries stamped in the future (clock skew) have zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// `true` iff `now - written_at <= ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) <= ttl
    }
}
