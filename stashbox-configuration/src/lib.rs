//! Serde configuration for stashbox.
//!
//! A [`StashConfig`] describes one cached remote: its namespace, the storage
//! it persists into, the TTL applied to reads and the throttle and fetch
//! policies. It is usually loaded from YAML:
//!
//! ```
//! use stashbox_configuration::StashConfig;
//!
//! let config = StashConfig::from_yaml(r#"
//! namespace: weather
//! ttl: 10m
//! storage:
//!   type: Memory
//! throttle:
//!   default_backoff: 2m
//!   arm_policy: per_operation
//! "#)?;
//!
//! let fetcher = config.into_fetcher()?;
//! assert_eq!(fetcher.cache().namespace(), "weather");
//! assert_eq!(fetcher.ttl(), std::time::Duration::from_secs(600));
//! # Ok::<(), stashbox_configuration::ConfigError>(())
//! ```
#![warn(missing_docs)]

mod error;
/// Storage selection.
pub mod storage;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stashbox::{FetchPolicy, Fetcher, ThrottleConfig, Throttler, TtlCache};

pub use error::ConfigError;
pub use storage::StorageConfig;

/// TTL used when the configuration doesn't set one.
pub const DEFAULT_TTL: Duration = Fetcher::DEFAULT_TTL;

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

/// Configuration of one cached remote.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StashConfig {
    /// Cache namespace.
    pub namespace: String,
    /// Freshness window for reads (e.g. "30s", "5m").
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
    /// Where entries are persisted.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Throttle windows and polling.
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Fetch wrapper behavior.
    #[serde(default)]
    pub fetch: FetchPolicy,
}

impl StashConfig {
    /// Configuration with defaults for everything but the namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl: DEFAULT_TTL,
            storage: StorageConfig::default(),
            throttle: ThrottleConfig::default(),
            fetch: FetchPolicy::default(),
        }
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "namespace",
                reason: "must not be empty".to_string(),
            });
        }
        if self.throttle.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "throttle.poll_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the cache over the configured storage.
    pub fn into_cache(self) -> Result<TtlCache, ConfigError> {
        self.validate()?;
        Ok(TtlCache::new(self.namespace, self.storage.into_storage()?))
    }

    /// Builds a throttler from the throttle section.
    pub fn throttler(&self) -> Throttler {
        Throttler::with_config(self.throttle.clone())
    }

    /// Builds a fetcher: cache, throttler, fetch policy and TTL together.
    pub fn into_fetcher(self) -> Result<Fetcher, ConfigError> {
        let throttler = self.throttler();
        let policy = self.fetch.clone();
        let ttl = self.ttl;
        let cache = self.into_cache()?;
        Ok(Fetcher::new(cache, throttler)
            .with_policy(policy)
            .with_ttl(ttl))
    }
}
