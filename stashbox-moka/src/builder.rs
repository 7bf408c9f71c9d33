//! Builder for configuring [`MokaStorage`].

use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use stashbox_core::{CacheKey, StorageLabel};

use crate::storage::MokaStorage;

/// Marker type: capacity has not been configured yet.
///
/// You must call either [`max_entries()`](MokaStorageBuilder::max_entries)
/// or [`max_bytes()`](MokaStorageBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating a [`MokaStorage`].
///
/// Capacity uses the typestate pattern: `build()` only exists once exactly
/// one of the two limits is set.
///
/// ```
/// use stashbox_moka::MokaStorage;
///
/// let storage = MokaStorage::builder()
///     .label("weather")
///     .max_bytes(8 * 1024 * 1024)
///     .build();
/// ```
pub struct MokaStorageBuilder<Cap> {
    capacity: Cap,
    label: StorageLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStorageBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StorageLabel::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the storage can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStorageBuilder<EntryCapacity> {
        MokaStorageBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget in bytes (keys plus raw records).
    pub fn max_bytes(self, bytes: u64) -> MokaStorageBuilder<ByteCapacity> {
        MokaStorageBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStorageBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStorageBuilder<Cap> {
    /// Sets the label reported in metrics. Default: `"moka"`.
    pub fn label(mut self, label: impl Into<StorageLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// Defaults to [`EvictionPolicy::tiny_lfu()`] for entry capacity and
    /// [`EvictionPolicy::lru()`] for byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStorageBuilder<EntryCapacity> {
    /// Builds the storage with entry-count based capacity.
    pub fn build(self) -> MokaStorage {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<CacheKey, String> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .build();
        MokaStorage::from_parts(cache, self.label)
    }
}

impl MokaStorageBuilder<ByteCapacity> {
    /// Builds the storage with byte-based capacity.
    ///
    /// Defaults to LRU: TinyLFU admission can reject new weighted entries
    /// even when eviction would make room.
    pub fn build(self) -> MokaStorage {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<CacheKey, String> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .build();
        MokaStorage::from_parts(cache, self.label)
    }
}

fn byte_weigher(key: &CacheKey, value: &String) -> u32 {
    let size = key.namespace().len() + key.key().len() + value.len();
    size.min(u32::MAX as usize) as u32
}
