#![warn(missing_docs)]
//! # stashbox-core
//!
//! Shared vocabulary for the stashbox cached-fetch toolkit.
//!
//! Storage implementations (`stashbox-backend`, `stashbox-moka`,
//! `stashbox-file`) and the cache/throttle layer (`stashbox`) agree on the
//! types defined here:
//!
//! - [`CacheKey`] - a key scoped to a namespace
//! - [`CacheEntry`] - the persisted `{ data, timestamp }` record
//! - [`StorageLabel`] - a name used in metrics and logs
//! - [`Clock`] - the time source, swappable for tests
//!
//! ## Feature Flags
//!
//! - `test-helpers` - exposes [`MockClock`] for simulated time in tests
//!

pub mod clock;
pub mod entry;
pub mod key;
pub mod label;

pub use clock::{Clock, SharedClock, SystemClock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use label::StorageLabel;
#[doc(hidden)]
pub use smol_str::SmolStr;
