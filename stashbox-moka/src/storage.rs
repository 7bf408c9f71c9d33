//! Moka storage implementation.

use async_trait::async_trait;
use moka::future::Cache;
use stashbox_backend::{DeleteStatus, Storage, StorageResult};
use stashbox_core::{CacheKey, StorageLabel};

use crate::builder::{MokaStorageBuilder, NoCapacity};

/// Bounded in-memory storage powered by Moka.
///
/// Cloning is cheap; clones share the same underlying cache.
///
/// # Caveats
///
/// - Data is **not persisted**; entries are lost on process restart
/// - Eviction is asynchronous, so an over-capacity cache may briefly hold
///   more entries until Moka runs its pending maintenance
#[derive(Clone)]
pub struct MokaStorage {
    cache: Cache<CacheKey, String>,
    label: StorageLabel,
}

impl std::fmt::Debug for MokaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStorage")
            .field("label", &self.label)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MokaStorage {
    /// Creates a new builder. Capacity must be set before `build()`.
    pub fn builder() -> MokaStorageBuilder<NoCapacity> {
        MokaStorageBuilder::new()
    }

    pub(crate) fn from_parts(cache: Cache<CacheKey, String>, label: StorageLabel) -> Self {
        Self { cache, label }
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, String> {
        &self.cache
    }
}

#[async_trait]
impl Storage for MokaStorage {
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        self.cache.insert(key.clone(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        Ok(match self.cache.remove(key).await {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        let keys: Vec<_> = self
            .cache
            .iter()
            .filter(|(key, _)| key.belongs_to(namespace))
            .map(|(key, _)| key)
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.cache.remove(&*key).await.is_some() {
                removed += 1;
            }
        }
        tracing::trace!(namespace, removed, "cleared moka namespace");
        Ok(removed)
    }

    fn label(&self) -> StorageLabel {
        self.label.clone()
    }
}
