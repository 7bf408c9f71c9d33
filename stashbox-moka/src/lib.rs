//! Bounded in-memory [`Storage`](stashbox_backend::Storage) backed by
//! [Moka](https://docs.rs/moka).
//!
//! Unlike `MemoryStorage`, a `MokaStorage` caps how much it holds, either by
//! entry count or by approximate bytes, and evicts least recently used
//! records once full. Eviction only ever turns a hit into a miss, so TTL
//! semantics above it are unaffected.
//!
//! ```
//! use stashbox_moka::MokaStorage;
//!
//! let storage = MokaStorage::builder().max_entries(10_000).build();
//! ```
#![warn(missing_docs)]

mod builder;
mod storage;

pub use builder::{ByteCapacity, EntryCapacity, MokaStorageBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
pub use storage::MokaStorage;
