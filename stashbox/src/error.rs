use std::time::Duration;

use stashbox_core::CacheKey;
use thiserror::Error;

/// Failure reported by a remote call passed to
/// [`Fetcher::fetch_cached`](crate::Fetcher::fetch_cached).
///
/// The closure classifies its own failure: only it knows how the remote
/// signals rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote rejected the call for exceeding its rate limit.
    ///
    /// `retry_after` is the server's hint, if it sent one. Without it the
    /// throttler falls back to its default backoff.
    #[error("rate limited by remote")]
    RateLimited {
        /// Server-provided delay before the next attempt.
        retry_after: Option<Duration>,
    },
    /// Any other failure: transport, non-2xx status, undecodable body.
    #[error("remote call failed{}: {message}", status_suffix(.status))]
    Failed {
        /// HTTP-like status code, when there was a response at all.
        status: Option<u16>,
        /// Human-readable description.
        message: String,
    },
}

impl RemoteError {
    /// Shorthand for [`RemoteError::Failed`].
    pub fn failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Failed {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for [`RemoteError::RateLimited`].
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        Self::RateLimited { retry_after }
    }
}

/// Error returned from [`Fetcher::fetch_cached`](crate::Fetcher::fetch_cached).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote signalled rate limiting and the throttle is now armed.
    ///
    /// Retryable once `retry_after` has elapsed. The fetcher never retries
    /// on its own.
    #[error("rate limited, retry in {}", human_duration(.retry_after))]
    RateLimited {
        /// The window the throttle was armed with.
        retry_after: Duration,
    },
    /// The remote call failed for a reason other than rate limiting.
    #[error("remote call failed{}: {message}", status_suffix(.status))]
    Remote {
        /// Status code reported by the remote, if any.
        status: Option<u16>,
        /// Underlying error message.
        message: String,
    },
}

impl FetchError {
    /// Returns `true` if the same call may succeed after waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Status code carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RateLimited { .. } => Some(429),
            FetchError::Remote { status, .. } => *status,
        }
    }
}

/// A stored record that could not be decoded as the requested type.
///
/// Never returned as an error: the cache removes the record, logs it and
/// reports [`Lookup::Corrupt`](crate::Lookup::Corrupt).
#[derive(Debug, Error)]
#[error("corrupt cache entry {key}: {source}")]
pub struct CorruptEntry {
    /// Key of the discarded record.
    pub key: CacheKey,
    /// Decoding failure.
    #[source]
    pub source: serde_json::Error,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn human_duration(duration: &Duration) -> humantime_serde::re::humantime::FormattedDuration {
    humantime_serde::re::humantime::format_duration(*duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let limited = FetchError::RateLimited {
            retry_after: Duration::from_secs(2),
        };
        let failed = FetchError::Remote {
            status: Some(500),
            message: "boom".into(),
        };
        assert!(limited.is_retryable());
        assert!(!failed.is_retryable());
        assert_eq!(failed.status(), Some(500));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            RemoteError::failed(Some(503), "unavailable").to_string(),
            "remote call failed (503): unavailable"
        );
        assert_eq!(
            FetchError::Remote {
                status: None,
                message: "connection reset".into()
            }
            .to_string(),
            "remote call failed: connection reset"
        );
        assert_eq!(
            FetchError::RateLimited {
                retry_after: Duration::from_secs(300)
            }
            .to_string(),
            "rate limited, retry in 5m"
        );
        assert_eq!(
            FetchError::RateLimited {
                retry_after: Duration::from_millis(500)
            }
            .to_string(),
            "rate limited, retry in 500ms"
        );
    }
}
