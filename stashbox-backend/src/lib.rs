//! Storage trait and in-memory implementation for stashbox.
//!
//! A [`Storage`] is the persistence layer under a TTL cache: a plain async
//! key/value store of raw strings, with no knowledge of timestamps or TTLs.
//! If you want to keep cache records somewhere new, implement [`Storage`].
#![warn(missing_docs)]
mod error;
mod memory;
pub mod metrics;
mod storage;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use stashbox_core::{CacheKey, StorageLabel};
pub use storage::{Storage, StorageResult};

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
