//! Storage metrics for stashbox.
//!
//! Enable the `metrics` feature to record these; without it every function
//! here is an empty inline call.
//!
//! All metrics follow the pattern `stashbox_storage_{operation}_{metric_type}`
//! and carry a `storage` label.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Measures a storage call.
///
/// Holds an `Instant` only when the `metrics` feature is on; otherwise it is
/// zero-sized and `elapsed` returns zero.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts timing.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Time since [`Timer::new`], or `Duration::ZERO` without the feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for total read operations counter.
    pub static ref STORAGE_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_read_total",
            "Total number of storage read operations."
        );
        "stashbox_storage_read_total"
    };

    /// Metric name for read duration histogram.
    pub static ref STORAGE_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stashbox_storage_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of storage reads in seconds."
        );
        "stashbox_storage_read_duration_seconds"
    };

    /// Metric name for read errors counter.
    pub static ref STORAGE_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_read_errors_total",
            "Total number of failed storage reads."
        );
        "stashbox_storage_read_errors_total"
    };

    /// Metric name for total write operations counter.
    pub static ref STORAGE_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_write_total",
            "Total number of storage write operations."
        );
        "stashbox_storage_write_total"
    };

    /// Metric name for total bytes written counter.
    pub static ref STORAGE_WRITE_BYTES: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_write_bytes_total",
            "Total bytes written to storage."
        );
        "stashbox_storage_write_bytes_total"
    };

    /// Metric name for write errors counter.
    pub static ref STORAGE_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "stashbox_storage_write_errors_total",
            "Total number of failed storage writes."
        );
        "stashbox_storage_write_errors_total"
    };
}

/// Record a read operation with duration.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(storage: &str, duration: Duration) {
    metrics::counter!(*STORAGE_READ_TOTAL, "storage" => storage.to_string()).increment(1);
    metrics::histogram!(*STORAGE_READ_DURATION, "storage" => storage.to_string())
        .record(duration.as_secs_f64());
}

/// Record a read operation (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_storage: &str, _duration: Duration) {}

/// Record a read error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read_error(storage: &str) {
    metrics::counter!(*STORAGE_READ_ERRORS, "storage" => storage.to_string()).increment(1);
}

/// Record a read error (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read_error(_storage: &str) {}

/// Record a write operation and its payload size.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(storage: &str, bytes: usize) {
    metrics::counter!(*STORAGE_WRITE_TOTAL, "storage" => storage.to_string()).increment(1);
    metrics::counter!(*STORAGE_WRITE_BYTES, "storage" => storage.to_string())
        .increment(bytes as u64);
}

/// Record a write operation (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_storage: &str, _bytes: usize) {}

/// Record a write error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write_error(storage: &str) {
    metrics::counter!(*STORAGE_WRITE_ERRORS, "storage" => storage.to_string()).increment(1);
}

/// Record a write error (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write_error(_storage: &str) {}
