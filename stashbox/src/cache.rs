//! Namespaced TTL cache over a [`Storage`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;
use stashbox_backend::metrics::{record_read, record_read_error, record_write, record_write_error};
use stashbox_backend::{DeleteStatus, MemoryStorage, Storage, StorageError};
use stashbox_core::{CacheEntry, CacheKey, SharedClock, SystemClock};
use tracing::{debug, warn};

use crate::error::CorruptEntry;
use crate::metrics::{self, CacheOutcome, Timer};

/// Result of [`TtlCache::lookup`].
#[derive(Debug)]
pub enum Lookup<T> {
    /// A fresh entry.
    Hit(CacheEntry<T>),
    /// Nothing stored under the key, or the storage could not be read.
    Miss,
    /// An entry older than the TTL. It has been removed.
    Expired,
    /// An entry that failed to decode. It has been removed.
    Corrupt(CorruptEntry),
}

impl<T> Lookup<T> {
    /// Returns `true` for [`Lookup::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// The cached value on a hit, `None` otherwise.
    pub fn into_value(self) -> Option<T> {
        match self {
            Lookup::Hit(entry) => Some(entry.into_inner()),
            _ => None,
        }
    }

    fn outcome(&self) -> CacheOutcome {
        match self {
            Lookup::Hit(_) => CacheOutcome::Hit,
            Lookup::Miss => CacheOutcome::Miss,
            Lookup::Expired => CacheOutcome::Expired,
            Lookup::Corrupt(_) => CacheOutcome::Corrupt,
        }
    }
}

/// Key/value cache for one namespace with read-time TTL evaluation.
///
/// Each value is stored as `{ "data": value, "timestamp": millis }`.
/// Freshness is decided by the TTL passed to each read, so one entry can be
/// fresh for one caller and stale for another. Reads never fail: absent,
/// expired, corrupt and unreadable entries all come back as a miss, and the
/// last three are removed on the way.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), stashbox::StorageError> {
/// use std::time::Duration;
/// use stashbox::TtlCache;
///
/// let cache = TtlCache::in_memory("weather");
/// cache.set("berlin", &12.5_f64).await?;
///
/// let value: Option<f64> = cache.get("berlin", Duration::from_secs(60)).await;
/// assert_eq!(value, Some(12.5));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TtlCache {
    namespace: SmolStr,
    storage: Arc<dyn Storage>,
    clock: SharedClock,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("namespace", &self.namespace)
            .field("storage", &self.storage.label())
            .finish()
    }
}

impl TtlCache {
    /// Cache for `namespace` persisting into `storage`.
    pub fn new(namespace: impl Into<SmolStr>, storage: Arc<dyn Storage>) -> Self {
        Self {
            namespace: namespace.into(),
            storage,
            clock: SystemClock::shared(),
        }
    }

    /// Cache for `namespace` over a fresh [`MemoryStorage`].
    pub fn in_memory(namespace: impl Into<SmolStr>) -> Self {
        Self::new(namespace, Arc::new(MemoryStorage::new()))
    }

    /// Replaces the time source used for timestamps and TTL checks.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Namespace this cache reads and writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Underlying storage.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Full storage key for `key` in this namespace.
    pub fn cache_key(&self, key: &str) -> CacheKey {
        CacheKey::new(self.namespace.clone(), key)
    }

    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// Replaces any previous entry. Fails if the value can't be serialized
    /// or the storage rejects the write.
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + ?Sized,
    {
        let cache_key = self.cache_key(key);
        let raw = serde_json::to_string(&CacheEntry::new(value, self.clock.now()))?;
        let bytes = raw.len();
        let label = self.storage.label();

        match self.storage.write(&cache_key, raw).await {
            Ok(()) => {
                record_write(label.as_str(), bytes);
                debug!(key = %cache_key, bytes, "cache entry written");
                Ok(())
            }
            Err(error) => {
                record_write_error(label.as_str());
                Err(error)
            }
        }
    }

    /// Returns the value under `key` if it is younger than `ttl`.
    pub async fn get<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.lookup(key, ttl).await.into_value()
    }

    /// Like [`get`](Self::get), but reports why nothing was returned.
    pub async fn lookup<T>(&self, key: &str, ttl: Duration) -> Lookup<T>
    where
        T: DeserializeOwned,
    {
        let cache_key = self.cache_key(key);
        let lookup = self.lookup_inner(cache_key, ttl).await;
        metrics::record_cache_outcome(&self.namespace, lookup.outcome());
        lookup
    }

    async fn lookup_inner<T>(&self, cache_key: CacheKey, ttl: Duration) -> Lookup<T>
    where
        T: DeserializeOwned,
    {
        let label = self.storage.label();
        let timer = Timer::new();
        let raw = match self.storage.read(&cache_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                record_read(label.as_str(), timer.elapsed());
                return Lookup::Miss;
            }
            Err(error) => {
                record_read_error(label.as_str());
                warn!(key = %cache_key, storage = %label, %error, "cache read failed, treating as miss");
                return Lookup::Miss;
            }
        };
        record_read(label.as_str(), timer.elapsed());

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(source) => {
                warn!(key = %cache_key, error = %source, "discarding corrupt cache entry");
                self.discard(&cache_key).await;
                return Lookup::Corrupt(CorruptEntry {
                    key: cache_key,
                    source,
                });
            }
        };

        if entry.is_fresh(ttl, self.clock.now()) {
            debug!(key = %cache_key, "cache hit");
            Lookup::Hit(entry)
        } else {
            debug!(key = %cache_key, "cache entry expired");
            self.discard(&cache_key).await;
            Lookup::Expired
        }
    }

    async fn discard(&self, key: &CacheKey) {
        if let Err(error) = self.storage.remove(key).await {
            warn!(%key, %error, "failed to remove cache entry");
        }
    }

    /// Deletes the entry under `key`, whatever its age.
    pub async fn remove(&self, key: &str) -> Result<DeleteStatus, StorageError> {
        self.storage.remove(&self.cache_key(key)).await
    }

    /// Deletes every entry in this namespace. Returns how many were removed.
    pub async fn clear(&self) -> Result<u64, StorageError> {
        let removed = self.storage.clear(&self.namespace).await?;
        debug!(namespace = %self.namespace, removed, "cache namespace cleared");
        Ok(removed)
    }

    /// Returns `true` if anything is stored under `key`.
    ///
    /// Ignores the TTL, and an unreadable storage reports `false`.
    pub async fn has(&self, key: &str) -> bool {
        let cache_key = self.cache_key(key);
        match self.storage.read(&cache_key).await {
            Ok(raw) => raw.is_some(),
            Err(error) => {
                warn!(key = %cache_key, %error, "cache presence check failed");
                false
            }
        }
    }
}
