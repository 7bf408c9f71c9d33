use std::sync::Arc;

use async_trait::async_trait;
use stashbox_core::{CacheKey, StorageLabel};

use crate::{DeleteStatus, StorageError};

/// Result of a [`Storage`] operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// Async key/value persistence for serialized cache records.
///
/// Values are opaque strings; the cache layer owns their format. Keys carry
/// their namespace so a single store can host many logical caches, and
/// [`clear`](Storage::clear) drops exactly one namespace.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the raw record stored under `key`, or `None` if absent.
    ///
    /// No freshness check happens here; TTL evaluation belongs to the cache.
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous record.
    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()>;

    /// Deletes the record under `key`.
    ///
    /// A missing key yields [`DeleteStatus::Missing`], not an error.
    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus>;

    /// Removes every entry of `namespace`, returning how many were dropped.
    ///
    /// Clearing an empty or unknown namespace is not an error.
    async fn clear(&self, namespace: &str) -> StorageResult<u64>;

    /// Returns the label of this storage for metrics and log fields.
    fn label(&self) -> StorageLabel {
        StorageLabel::new_static("storage")
    }
}

#[async_trait]
impl<S> Storage for &S
where
    S: Storage + ?Sized,
{
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        (**self).clear(namespace).await
    }

    fn label(&self) -> StorageLabel {
        (**self).label()
    }
}

#[async_trait]
impl<S> Storage for Box<S>
where
    S: Storage + ?Sized,
{
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        (**self).clear(namespace).await
    }

    fn label(&self) -> StorageLabel {
        (**self).label()
    }
}

#[async_trait]
impl<S> Storage for Arc<S>
where
    S: Storage + ?Sized,
{
    async fn read(&self, key: &CacheKey) -> StorageResult<Option<String>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: String) -> StorageResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> StorageResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self, namespace: &str) -> StorageResult<u64> {
        (**self).clear(namespace).await
    }

    fn label(&self) -> StorageLabel {
        (**self).label()
    }
}
