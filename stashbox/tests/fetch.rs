//! Fetch wrapper behavior: cache short-circuit, throttle interaction and
//! failure classification.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stashbox::{
    DeleteStatus, FetchError, FetchPolicy, Fetcher, Operation, Remote, RemoteError, Storage,
    StorageError, ThrottleConfig, Throttler, TtlCache,
};
use stashbox_backend::StorageResult;
use stashbox_core::{CacheKey, MockClock, StorageLabel};

const TTL: Duration = Duration::from_secs(60);

fn fetcher() -> (Fetcher, MockClock) {
    let clock = MockClock::new();
    let cache = TtlCache::in_memory("weather").with_clock(clock.shared());
    let throttler = Throttler::with_clock(ThrottleConfig::default(), clock.shared());
    (Fetcher::new(cache, throttler), clock)
}

/// Remote call stub counting its invocations.
#[derive(Clone, Default)]
struct Calls(Arc<AtomicUsize>);

impl Calls {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn succeed<T>(&self, value: T) -> impl Future<Output = Result<Remote<T>, RemoteError>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        async move { Ok(Remote::new(value)) }
    }

    fn fail<T>(&self, error: RemoteError) -> impl Future<Output = Result<Remote<T>, RemoteError>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        async move { Err(error) }
    }
}

#[tokio::test]
async fn test_fresh_entry_skips_remote() {
    let (fetcher, _clock) = fetcher();
    let calls = Calls::default();
    fetcher.cache().set("berlin", &12).await.unwrap();

    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed(99))
        .await
        .unwrap();

    assert_eq!(value, 12);
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_fresh_entry_ignores_armed_throttle() {
    let (fetcher, clock) = fetcher();
    fetcher.cache().set("berlin", &12).await.unwrap();
    fetcher
        .throttler()
        .handle_rate_limit_response(Operation::Read, None);

    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || async {
            Ok(Remote::new(99))
        })
        .await
        .unwrap();

    assert_eq!(value, 12);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_miss_fetches_and_caches() {
    let (fetcher, _clock) = fetcher();
    let calls = Calls::default();

    let first: String = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed("sunny".to_string()))
        .await
        .unwrap();
    let second: String = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed("rain".to_string()))
        .await
        .unwrap();

    assert_eq!(first, "sunny");
    assert_eq!(second, "sunny");
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let (fetcher, clock) = fetcher();
    let calls = Calls::default();
    fetcher.cache().set("berlin", &1).await.unwrap();
    clock.advance(TTL + Duration::from_millis(1));

    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed(2))
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_waits_out_throttle_then_calls_once() {
    let (fetcher, clock) = fetcher();
    let calls = Calls::default();
    fetcher
        .throttler()
        .handle_rate_limit_response(Operation::Read, Some(Duration::from_millis(100)));

    let mut called_at = None;
    let value: u64 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || {
            called_at = Some(clock.elapsed());
            calls.succeed(7)
        })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(calls.count(), 1);
    let called_at = called_at.expect("remote was not called");
    assert!(
        called_at >= Duration::from_millis(100),
        "remote called after {called_at:?}"
    );
    assert_eq!(fetcher.cache().get::<u64>("berlin", TTL).await, Some(7));
}

#[tokio::test]
async fn test_rate_limited_arms_throttle_and_skips_cache() {
    let (fetcher, _clock) = fetcher();
    let calls = Calls::default();

    let result: Result<i32, _> = fetcher
        .fetch_cached("berlin", TTL, Operation::Write, || {
            calls.fail(RemoteError::rate_limited(Some(Duration::from_secs(7))))
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(
        error,
        FetchError::RateLimited {
            retry_after: Duration::from_secs(7)
        }
    );
    assert!(error.is_retryable());
    assert_eq!(calls.count(), 1);
    assert!(fetcher.throttler().is_rate_limited(Operation::Write));
    assert!(fetcher.throttler().is_rate_limited(Operation::Read));
    assert!(!fetcher.cache().has("berlin").await);
}

#[tokio::test]
async fn test_rate_limited_without_hint_uses_default_backoff() {
    let (fetcher, _clock) = fetcher();

    let error = fetcher
        .fetch_cached::<i32, _, _>("berlin", TTL, Operation::Read, || async {
            Err(RemoteError::rate_limited(None))
        })
        .await
        .unwrap_err();

    assert_eq!(
        error,
        FetchError::RateLimited {
            retry_after: Duration::from_secs(300)
        }
    );
}

#[tokio::test]
async fn test_other_failure_is_not_retryable() {
    let (fetcher, _clock) = fetcher();

    let error = fetcher
        .fetch_cached::<i32, _, _>("berlin", TTL, Operation::Read, || async {
            Err(RemoteError::failed(Some(503), "service unavailable"))
        })
        .await
        .unwrap_err();

    assert_eq!(
        error,
        FetchError::Remote {
            status: Some(503),
            message: "service unavailable".into()
        }
    );
    assert!(!error.is_retryable());
    assert!(!fetcher.throttler().is_rate_limited(Operation::Read));
    assert!(!fetcher.cache().has("berlin").await);
}

#[tokio::test]
async fn test_failure_keeps_previous_stale_entry_untouched() {
    let (fetcher, clock) = fetcher();
    fetcher.cache().set("berlin", &1).await.unwrap();
    clock.advance(Duration::from_secs(61));

    let _ = fetcher
        .fetch_cached::<i32, _, _>("berlin", TTL, Operation::Read, || async {
            Err(RemoteError::failed(None, "offline"))
        })
        .await;

    // Expired entry was dropped by the lookup and nothing new was written.
    assert!(!fetcher.cache().has("berlin").await);
}

#[tokio::test]
async fn test_success_hint_arms_throttle() {
    let (fetcher, _clock) = fetcher();

    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, false, || async {
            Ok(Remote::new(5).with_retry_after(Some(Duration::from_secs(2))))
        })
        .await
        .unwrap();

    assert_eq!(value, 5);
    assert_eq!(
        fetcher.throttler().remaining(Operation::Read),
        Some(Duration::from_secs(2))
    );
    assert_eq!(fetcher.cache().get::<i32>("berlin", TTL).await, Some(5));
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let (fetcher, _clock) = fetcher();
    let calls = Calls::default();

    let _: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed(1))
        .await
        .unwrap();
    assert_eq!(
        fetcher.invalidate("berlin").await.unwrap(),
        DeleteStatus::Deleted(1)
    );
    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || calls.succeed(2))
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert_eq!(calls.count(), 2);
}

/// Storage that reads as empty and refuses every write.
struct ReadOnlyStorage;

#[async_trait]
impl Storage for ReadOnlyStorage {
    async fn read(&self, _key: &CacheKey) -> StorageResult<Option<String>> {
        Ok(None)
    }

    async fn write(&self, _key: &CacheKey, _value: String) -> StorageResult<()> {
        Err(StorageError::internal(std::io::Error::other("read-only")))
    }

    async fn remove(&self, _key: &CacheKey) -> StorageResult<DeleteStatus> {
        Ok(DeleteStatus::Missing)
    }

    async fn clear(&self, _namespace: &str) -> StorageResult<u64> {
        Ok(0)
    }

    fn label(&self) -> StorageLabel {
        StorageLabel::new_static("read-only")
    }
}

#[tokio::test]
async fn test_cache_write_failure_still_returns_value() {
    let cache = TtlCache::new("weather", Arc::new(ReadOnlyStorage));
    let fetcher = Fetcher::new(cache, Throttler::new());

    let value: i32 = fetcher
        .fetch_cached("berlin", TTL, Operation::Read, || async { Ok(Remote::new(3)) })
        .await
        .unwrap();

    assert_eq!(value, 3);
}

async fn concurrent_misses(single_flight: bool) -> usize {
    let fetcher = Fetcher::new(TtlCache::in_memory("weather"), Throttler::new())
        .with_policy(FetchPolicy { single_flight });
    let calls = Arc::new(AtomicUsize::new(0));

    let fetches = (0..5).map(|_| {
        let fetcher = fetcher.clone();
        let calls = calls.clone();
        async move {
            fetcher
                .fetch_cached("berlin", TTL, Operation::Read, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Remote::new(42))
                })
                .await
        }
    });
    let results: Vec<Result<i32, FetchError>> = futures::future::join_all(fetches).await;

    assert!(results.iter().all(|r| r == &Ok(42)));
    calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn test_single_flight_collapses_concurrent_misses() {
    assert_eq!(concurrent_misses(true).await, 1);
}

#[tokio::test]
async fn test_without_single_flight_every_miss_calls_remote() {
    assert_eq!(concurrent_misses(false).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_waiter_stalls_on_armed_throttle() {
    let clock = MockClock::new();
    let fetcher = Fetcher::new(
        TtlCache::in_memory("weather").with_clock(clock.shared()),
        Throttler::with_clock(ThrottleConfig::default(), clock.shared()),
    )
    .with_policy(FetchPolicy {
        single_flight: true,
    });
    let (release, released) = tokio::sync::oneshot::channel::<()>();

    let leader = tokio::spawn({
        let fetcher = fetcher.clone();
        async move {
            fetcher
                .fetch_cached::<i32, _, _>("berlin", TTL, Operation::Read, || async move {
                    let _ = released.await;
                    Err(RemoteError::rate_limited(Some(Duration::from_secs(2))))
                })
                .await
        }
    });
    // Let the leader take the flight before the follower asks for it.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let follower = tokio::spawn({
        let fetcher = fetcher.clone();
        let clock = clock.clone();
        async move {
            fetcher
                .fetch_cached("berlin", TTL, Operation::Read, || {
                    let called_at = clock.elapsed();
                    async move { Ok(Remote::new(called_at)) }
                })
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    release.send(()).unwrap();

    assert_eq!(
        leader.await.unwrap(),
        Err(FetchError::RateLimited {
            retry_after: Duration::from_secs(2)
        })
    );
    let called_at = follower.await.unwrap().unwrap();
    assert!(
        called_at >= Duration::from_secs(2),
        "follower called the remote after {called_at:?}"
    );
}
