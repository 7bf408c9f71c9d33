use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use stashbox::{ArmPolicy, FetchPolicy, Operation, Storage, ThrottleConfig};
use stashbox_configuration::storage::{File, Memory, Moka};
use stashbox_configuration::{ConfigError, DEFAULT_TTL, StashConfig, StorageConfig};

#[test]
fn test_full_config_deserialize() {
    let yaml = r#"
namespace: weather
ttl: 90s
storage:
  type: Moka
  max_capacity: 10000
  label: hot
throttle:
  default_backoff: 2m
  poll_interval: 250ms
  arm_policy: per_operation
fetch:
  single_flight: true
"#;

    let config = StashConfig::from_yaml(yaml).expect("failed to deserialize");

    assert_eq!(
        config,
        StashConfig {
            namespace: "weather".to_string(),
            ttl: Duration::from_secs(90),
            storage: StorageConfig::Moka(Moka {
                max_capacity: 10000,
                label: Some("hot".to_string()),
            }),
            throttle: ThrottleConfig {
                default_backoff: Duration::from_secs(120),
                poll_interval: Duration::from_millis(250),
                arm_policy: ArmPolicy::PerOperation,
            },
            fetch: FetchPolicy {
                single_flight: true
            },
        }
    );
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config = StashConfig::from_yaml("namespace: alerts\n").expect("failed to deserialize");

    assert_eq!(config, StashConfig::new("alerts"));
    assert_eq!(config.ttl, DEFAULT_TTL);
    assert_eq!(config.storage, StorageConfig::Memory(Memory::default()));
    assert_eq!(config.throttle.default_backoff, Duration::from_secs(300));
    assert_eq!(config.throttle.poll_interval, Duration::from_secs(1));
    assert_eq!(config.throttle.arm_policy, ArmPolicy::Shared);
    assert!(!config.fetch.single_flight);
}

#[test]
fn test_file_storage_deserialize() {
    let yaml = r#"
namespace: issues
storage:
  type: File
  path: /var/cache/stashbox
"#;

    let config = StashConfig::from_yaml(yaml).expect("failed to deserialize");

    assert_eq!(
        config.storage,
        StorageConfig::File(File {
            path: PathBuf::from("/var/cache/stashbox"),
            label: None,
        })
    );
}

#[test]
fn test_unknown_storage_type_is_rejected() {
    let yaml = r#"
namespace: issues
storage:
  type: Redis
"#;

    assert!(matches!(
        StashConfig::from_yaml(yaml),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_empty_namespace_is_rejected() {
    assert!(matches!(
        StashConfig::from_yaml("namespace: \"\"\n"),
        Err(ConfigError::InvalidValue {
            field: "namespace",
            ..
        })
    ));
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let yaml = r#"
namespace: weather
throttle:
  poll_interval: 0s
"#;

    assert!(matches!(
        StashConfig::from_yaml(yaml),
        Err(ConfigError::InvalidValue {
            field: "throttle.poll_interval",
            ..
        })
    ));
}

#[test]
fn test_zero_moka_capacity_is_rejected() {
    let storage = StorageConfig::Moka(Moka {
        max_capacity: 0,
        label: None,
    });
    assert!(matches!(
        storage.into_storage(),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn test_storage_labels() {
    let memory = StorageConfig::Memory(Memory {
        label: Some("primary".to_string()),
    })
    .into_storage()
    .unwrap();
    assert_eq!(memory.label().as_str(), "primary");

    let moka = StorageConfig::Moka(Moka {
        max_capacity: 10,
        label: None,
    })
    .into_storage()
    .unwrap();
    assert_eq!(moka.label().as_str(), "moka");
}

#[tokio::test]
async fn test_file_config_builds_working_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StashConfig::new("issues");
    config.storage = StorageConfig::File(File {
        path: dir.path().to_path_buf(),
        label: None,
    });
    config.fetch.single_flight = true;
    config.ttl = Duration::from_secs(45);

    let fetcher = config.into_fetcher().unwrap();
    assert_eq!(fetcher.ttl(), Duration::from_secs(45));
    let value: Vec<u32> = fetcher
        .fetch("open", Operation::Read, || async {
            Ok(stashbox::Remote::new(vec![1, 2, 3]))
        })
        .await
        .unwrap();

    assert_eq!(value, vec![1, 2, 3]);
    assert!(fetcher.policy().single_flight);
    assert!(dir.path().join("issues.json").exists());
}

#[test]
fn test_throttler_from_config() {
    let mut config = StashConfig::new("weather");
    config.throttle.default_backoff = Duration::from_secs(10);

    let throttler = config.throttler();
    assert_eq!(
        throttler.handle_rate_limit_response(Operation::Read, None),
        Duration::from_secs(10)
    );
}
