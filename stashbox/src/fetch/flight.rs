//! Per-key serialization of remote calls.

use std::sync::Arc;

use dashmap::DashMap;
use stashbox_core::CacheKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Locks = Arc<DashMap<CacheKey, Arc<Mutex<()>>>>;

/// Registry of in-flight remote calls, keyed by cache key.
///
/// Entries live only while a flight is held or awaited.
#[derive(Clone, Debug, Default)]
pub(crate) struct FlightRegistry {
    locks: Locks,
}

impl FlightRegistry {
    /// Takes the flight for `key`, waiting for the current holder if any.
    ///
    /// The flag is `true` when another caller held the flight first, in
    /// which case it has probably refreshed the cache already.
    pub(crate) async fn acquire(&self, key: &CacheKey) -> (FlightGuard, bool) {
        let lock = self.locks.entry(key.clone()).or_default().value().clone();
        let (guard, waited) = match Arc::clone(&lock).try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => (lock.lock_owned().await, true),
        };
        let flight = FlightGuard {
            key: key.clone(),
            locks: self.locks.clone(),
            guard: Some(guard),
        };
        (flight, waited)
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Held for the duration of one remote call.
pub(crate) struct FlightGuard {
    key: CacheKey,
    locks: Locks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.guard.take();
        // The map holds one reference; any other belongs to a waiter.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
