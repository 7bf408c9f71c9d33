use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which throttle windows a rate-limit signal arms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArmPolicy {
    /// Reads and writes share one bucket: a 429 on either arms both.
    #[default]
    Shared,
    /// Only the operation that was rate limited is armed.
    PerOperation,
}

/// Throttler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Window armed when the remote gives no `Retry-After` (e.g. "5m").
    #[serde(with = "humantime_serde")]
    pub default_backoff: Duration,
    /// Upper bound of one sleep while stalling (e.g. "1s", "250ms").
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Read/write coupling.
    pub arm_policy: ArmPolicy,
}

impl ThrottleConfig {
    /// Backoff applied when the remote sends no hint.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(300);
    /// Default stall poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            default_backoff: Self::DEFAULT_BACKOFF,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            arm_policy: ArmPolicy::default(),
        }
    }
}

/// Fetch wrapper behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(default)]
pub struct FetchPolicy {
    /// Serialize remote calls per cache key.
    ///
    /// Concurrent misses for one key then produce a single remote call;
    /// the callers that waited re-read the cache instead.
    pub single_flight: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_defaults() {
        let config = ThrottleConfig::default();
        assert_eq!(config.default_backoff, Duration::from_millis(300_000));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.arm_policy, ArmPolicy::Shared);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ThrottleConfig =
            serde_json::from_str(r#"{"default_backoff":"90s","arm_policy":"per_operation"}"#)
                .unwrap();
        assert_eq!(config.default_backoff, Duration::from_secs(90));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.arm_policy, ArmPolicy::PerOperation);
        assert!(!FetchPolicy::default().single_flight);
    }
}
