//! Metrics declaration and recording helpers.
//!
//! Cache outcome counters carry a `namespace` label. Throttle and remote call
//! metrics also carry an `operation` label (`read` or `write`).

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use crate::Operation;

pub use stashbox_backend::metrics::Timer;

#[cfg(feature = "metrics")]
lazy_static! {
    // Cache outcome metrics

    /// Track number of fresh cache hits.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_hit_total",
            "Total number of fresh cache hits."
        );
        "stashbox_cache_hit_total"
    };
    /// Track number of cache misses (absent or unreadable).
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_miss_total",
            "Total number of cache misses."
        );
        "stashbox_cache_miss_total"
    };
    /// Track number of entries found past their TTL.
    pub static ref CACHE_EXPIRED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_expired_total",
            "Total number of expired cache entries removed on read."
        );
        "stashbox_cache_expired_total"
    };
    /// Track number of undecodable entries removed on read.
    pub static ref CACHE_CORRUPT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_cache_corrupt_total",
            "Total number of corrupt cache entries removed on read."
        );
        "stashbox_cache_corrupt_total"
    };

    // Throttle metrics

    /// Track number of calls that had to wait for a throttle window.
    pub static ref THROTTLE_STALL_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_throttle_stall_total",
            "Total number of calls delayed by an armed throttle."
        );
        "stashbox_throttle_stall_total"
    };
    /// Histogram of time spent waiting on the throttle.
    pub static ref THROTTLE_STALL_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stashbox_throttle_stall_duration_seconds",
            metrics::Unit::Seconds,
            "Time spent waiting for a throttle window in seconds."
        );
        "stashbox_throttle_stall_duration_seconds"
    };

    // Remote call metrics

    /// Track number of rate-limited remote calls.
    pub static ref RATE_LIMITED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_rate_limited_total",
            "Total number of remote calls rejected for rate limiting."
        );
        "stashbox_rate_limited_total"
    };
    /// Track number of failed remote calls, rate limiting excluded.
    pub static ref REMOTE_ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "stashbox_remote_error_total",
            "Total number of failed remote calls."
        );
        "stashbox_remote_error_total"
    };
    /// Histogram of remote call duration.
    pub static ref REMOTE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stashbox_remote_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of remote calls in seconds."
        );
        "stashbox_remote_duration_seconds"
    };
}

/// Outcome of a cache read, for metrics purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Fresh entry returned.
    Hit,
    /// Nothing usable stored.
    Miss,
    /// Entry older than the TTL.
    Expired,
    /// Entry failed to decode.
    Corrupt,
}

/// Record a cache read outcome.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_outcome(namespace: &str, outcome: CacheOutcome) {
    let name = match outcome {
        CacheOutcome::Hit => *CACHE_HIT_COUNTER,
        CacheOutcome::Miss => *CACHE_MISS_COUNTER,
        CacheOutcome::Expired => *CACHE_EXPIRED_COUNTER,
        CacheOutcome::Corrupt => *CACHE_CORRUPT_COUNTER,
    };
    metrics::counter!(name, "namespace" => namespace.to_string()).increment(1);
}

/// Record a cache read outcome (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_outcome(_namespace: &str, _outcome: CacheOutcome) {}

/// Record a completed throttle stall.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_stall(operation: Operation, waited: Duration) {
    metrics::counter!(*THROTTLE_STALL_COUNTER, "operation" => operation.as_str()).increment(1);
    metrics::histogram!(*THROTTLE_STALL_DURATION, "operation" => operation.as_str())
        .record(waited.as_secs_f64());
}

/// Record a completed throttle stall (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_stall(_operation: Operation, _waited: Duration) {}

/// Record the duration of a remote call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_remote_call(namespace: &str, operation: Operation, duration: Duration) {
    metrics::histogram!(
        *REMOTE_DURATION,
        "namespace" => namespace.to_string(),
        "operation" => operation.as_str()
    )
    .record(duration.as_secs_f64());
}

/// Record the duration of a remote call (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_remote_call(_namespace: &str, _operation: Operation, _duration: Duration) {}

/// Record a rate-limited remote call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_rate_limited(namespace: &str, operation: Operation) {
    metrics::counter!(
        *RATE_LIMITED_COUNTER,
        "namespace" => namespace.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Record a rate-limited remote call (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_rate_limited(_namespace: &str, _operation: Operation) {}

/// Record a failed remote call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_remote_error(namespace: &str, operation: Operation) {
    metrics::counter!(
        *REMOTE_ERROR_COUNTER,
        "namespace" => namespace.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Record a failed remote call (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_remote_error(_namespace: &str, _operation: Operation) {}
