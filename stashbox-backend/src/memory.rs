//! In-memory storage using DashMap.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stashbox_core::{CacheKey, StorageLabel};

use crate::{DeleteStatus, Storage, StorageResult};

/// Unbounded in-memory storage.
///
/// Thread-safe and cheap to clone: clones share the same map. Nothing is
/// persisted; use `stashbox-file` when entries must survive a restart, or
/// `stashbox-moka` when the number of entries has to be capped.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    store: Arc<DashMap<CacheKey, String>>,
    label: StorageLabel,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            label: StorageLabel::new_static("memory"),
        }
    }

    /// Overrides the label reported in metrics.
    pub fn with_label(mut self, label: impl Into<StorageLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no namespace holds any entry.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        Ok(self.store.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        self.store.insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        let mut removed = 0;
        self.store.retain(|key, _| {
            if key.belongs_to(namespace) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    fn label(&self) -> StorageLabel {
        self.label.clone()
    }
}
