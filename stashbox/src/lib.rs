//! # stashbox
//!
//! Cached remote fetch with TTL and client-side rate limiting.
//!
//! - [`TtlCache`] memoizes values per namespace and decides freshness at
//!   read time against the TTL each caller passes.
//! - [`Throttler`] remembers rate-limit windows for read and write traffic
//!   and makes later calls wait them out.
//! - [`Fetcher`] composes both: cache lookup, throttle stall, remote call,
//!   cache update, typed failure.
//!
//! Storage is pluggable through [`Storage`]: `MemoryStorage` ships here,
//! `stashbox-moka` and `stashbox-file` provide bounded and durable ones.
//!
//! ## Feature Flags
//!
//! - `metrics` - records cache, throttle and remote call metrics through the
//!   [`metrics`](https://docs.rs/metrics) facade
//! - `test-helpers` - re-exports `MockClock` for simulated time
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;

/// Error types for fetches and remote calls.
pub mod error;

/// Cached remote fetch state machine.
///
/// See [`Fetcher`](fetch::Fetcher) for the behavior of a single fetch.
pub mod fetch;

/// Metrics collection.
///
/// When the `metrics` feature is enabled, this module records:
/// - Cache hits, misses, expired and corrupt entries
/// - Throttle stalls and their duration
/// - Rate-limited and failed remote calls, remote call latency
pub mod metrics;

/// Throttler and fetch policy configuration.
pub mod policy;

pub mod throttle;

pub use cache::{Lookup, TtlCache};
pub use error::{CorruptEntry, FetchError, RemoteError};
pub use fetch::{Fetcher, Remote};
pub use policy::{ArmPolicy, FetchPolicy, ThrottleConfig};
pub use throttle::{Operation, Throttler};

pub use stashbox_backend::{DeleteStatus, MemoryStorage, Storage, StorageError, StorageLabel};
#[cfg(any(test, feature = "test-helpers"))]
pub use stashbox_core::MockClock;
pub use stashbox_core::{CacheEntry, CacheKey, Clock, SharedClock, SystemClock};
