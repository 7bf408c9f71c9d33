//! Cached remote fetch.
//!
//! [`Fetcher::fetch_cached`] runs a small state machine:
//!
//! ```text
//! CheckCache ──hit──────────────────────────────────────────────▶ Return
//!     │ miss
//!     ├──(single flight)──▶ AwaitFlight ──waited──▶ RecheckCache ──hit──▶ Return
//!     ▼                          │                      │ miss
//! Throttle ◀─────────────────────┴──────────────────────┘
//!     ▼
//! RemoteCall ──ok──────────▶ WriteCache ──▶ Return
//!     ├──rate limited──────▶ ArmThrottle ─▶ ReturnFailure
//!     └──failed───────────────────────────▶ ReturnFailure
//! ```

mod flight;
mod states;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use stashbox_backend::{DeleteStatus, StorageError};
use tracing::{debug, warn};

use crate::cache::{Lookup, TtlCache};
use crate::error::{FetchError, RemoteError};
use crate::metrics::{self, Timer};
use crate::policy::FetchPolicy;
use crate::throttle::{Operation, Throttler};

use flight::FlightRegistry;
use states::State;

/// Successful outcome of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote<T> {
    /// The fetched value.
    pub value: T,
    /// Rate-limit hint sent along with a successful response.
    ///
    /// When present, the throttler is armed with it after the value is
    /// cached, so the next miss waits before calling again.
    pub retry_after: Option<Duration>,
}

impl<T> Remote<T> {
    /// A value without a rate-limit hint.
    pub fn new(value: T) -> Self {
        Self {
            value,
            retry_after: None,
        }
    }

    /// Attaches a rate-limit hint.
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

impl<T> From<T> for Remote<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Combines a [`TtlCache`] and a [`Throttler`] around remote calls.
///
/// Cloning is cheap; clones share the cache, the throttle windows and the
/// in-flight registry.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), stashbox::FetchError> {
/// use std::time::Duration;
/// use stashbox::{Fetcher, Operation, Remote, RemoteError, Throttler, TtlCache};
///
/// let fetcher = Fetcher::new(TtlCache::in_memory("weather"), Throttler::new());
///
/// let temperature: f64 = fetcher
///     .fetch_cached("berlin", Duration::from_secs(300), Operation::Read, || async {
///         Ok::<_, RemoteError>(Remote::new(12.5))
///     })
///     .await?;
/// assert_eq!(temperature, 12.5);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Fetcher {
    cache: TtlCache,
    throttler: Throttler,
    policy: FetchPolicy,
    ttl: Duration,
    flights: FlightRegistry,
}

impl Fetcher {
    /// TTL used by [`Fetcher::fetch`] unless [`Fetcher::with_ttl`] sets one.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Fetcher with the default [`FetchPolicy`] and TTL.
    pub fn new(cache: TtlCache, throttler: Throttler) -> Self {
        Self {
            cache,
            throttler,
            policy: FetchPolicy::default(),
            ttl: Self::DEFAULT_TTL,
            flights: FlightRegistry::default(),
        }
    }

    /// Replaces the fetch policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the TTL applied by [`Fetcher::fetch`].
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// TTL applied by [`Fetcher::fetch`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cache results are stored in.
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// The throttler guarding remote calls.
    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Active fetch policy.
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Drops the cached value for `key` so the next fetch goes remote.
    pub async fn invalidate(&self, key: &str) -> Result<DeleteStatus, StorageError> {
        self.cache.remove(key).await
    }

    /// [`Fetcher::fetch_cached`] with the fetcher's own [`ttl`](Fetcher::ttl).
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        op: impl Into<Operation>,
        remote_call: F,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Remote<T>, RemoteError>>,
    {
        self.fetch_cached(key, self.ttl, op, remote_call).await
    }

    /// Returns the cached value for `key`, or fetches, caches and returns it.
    ///
    /// A fresh entry is returned without touching the throttle or the
    /// remote. Otherwise the call waits out any armed throttle window for
    /// `op`, then invokes `remote_call` exactly once:
    ///
    /// - success: the value is cached and returned; a `retry_after` hint arms
    ///   the throttle. A failed cache write is logged and the value is still
    ///   returned.
    /// - [`RemoteError::RateLimited`]: the throttle is armed and
    ///   [`FetchError::RateLimited`] is returned. Nothing is retried.
    /// - [`RemoteError::Failed`]: returned as [`FetchError::Remote`].
    ///
    /// The cache is never written on failure.
    pub async fn fetch_cached<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        op: impl Into<Operation>,
        remote_call: F,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Remote<T>, RemoteError>>,
    {
        let op = op.into();
        let namespace = self.cache.namespace();
        let mut state = State::CheckCache { remote_call };

        loop {
            debug!(namespace, key, operation = %op, state = ?state, "fetch transition");
            state = match state {
                State::CheckCache { remote_call } => {
                    match self.cache.lookup::<T>(key, ttl).await {
                        Lookup::Hit(entry) => State::Return(entry.into_inner()),
                        _ if self.policy.single_flight => State::AwaitFlight { remote_call },
                        _ => State::Throttle {
                            remote_call,
                            flight: None,
                        },
                    }
                }
                State::AwaitFlight { remote_call } => {
                    let cache_key = self.cache.cache_key(key);
                    match self.flights.acquire(&cache_key).await {
                        (flight, true) => State::RecheckCache {
                            remote_call,
                            flight,
                        },
                        (flight, false) => State::Throttle {
                            remote_call,
                            flight: Some(flight),
                        },
                    }
                }
                State::RecheckCache {
                    remote_call,
                    flight,
                } => match self.cache.lookup::<T>(key, ttl).await {
                    Lookup::Hit(entry) => State::Return(entry.into_inner()),
                    _ => State::Throttle {
                        remote_call,
                        flight: Some(flight),
                    },
                },
                State::Throttle {
                    remote_call,
                    flight,
                } => {
                    self.throttler.stall_if_required(op).await;
                    State::RemoteCall {
                        remote_call,
                        flight,
                    }
                }
                State::RemoteCall {
                    remote_call,
                    flight,
                } => {
                    let timer = Timer::new();
                    let result = remote_call().await;
                    metrics::record_remote_call(namespace, op, timer.elapsed());
                    match result {
                        Ok(remote) => State::WriteCache { remote, flight },
                        Err(RemoteError::RateLimited { retry_after }) => State::ArmThrottle {
                            retry_after,
                            flight,
                        },
                        Err(RemoteError::Failed { status, message }) => {
                            metrics::record_remote_error(namespace, op);
                            warn!(namespace, key, ?status, %message, "remote call failed");
                            State::ReturnFailure(FetchError::Remote { status, message })
                        }
                    }
                }
                State::WriteCache { remote, flight } => {
                    let Remote { value, retry_after } = remote;
                    if let Err(error) = self.cache.set(key, &value).await {
                        warn!(namespace, key, %error, "failed to cache remote result");
                    }
                    if retry_after.is_some() {
                        self.throttler.handle_rate_limit_response(op, retry_after);
                    }
                    drop(flight);
                    State::Return(value)
                }
                State::ArmThrottle {
                    retry_after,
                    flight,
                } => {
                    metrics::record_rate_limited(namespace, op);
                    let window = self.throttler.handle_rate_limit_response(op, retry_after);
                    drop(flight);
                    warn!(namespace, key, operation = %op, window_ms = window.as_millis() as u64, "remote rate limited");
                    State::ReturnFailure(FetchError::RateLimited {
                        retry_after: window,
                    })
                }
                State::Return(value) => return Ok(value),
                State::ReturnFailure(error) => return Err(error),
            };
        }
    }
}
