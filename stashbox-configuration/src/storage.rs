use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stashbox_backend::{MemoryStorage, Storage};

use crate::error::ConfigError;

/// Unbounded in-memory storage.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct Memory {
    /// Optional label for this storage (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Bounded in-memory storage backed by Moka.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    /// Maximum number of entries held.
    pub max_capacity: u64,
    /// Optional label for this storage (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// JSON files on disk, one per namespace.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct File {
    /// Directory holding the namespace documents.
    pub path: PathBuf,
    /// Optional label for this storage (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Storage selection, tagged by `type`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// See [`Memory`].
    Memory(Memory),
    /// See [`Moka`].
    Moka(Moka),
    /// See [`File`].
    File(File),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory(Memory::default())
    }
}

impl StorageConfig {
    /// Builds the configured storage.
    pub fn into_storage(self) -> Result<Arc<dyn Storage>, ConfigError> {
        match self {
            StorageConfig::Memory(config) => {
                let mut storage = MemoryStorage::new();
                if let Some(label) = config.label {
                    storage = storage.with_label(label);
                }
                Ok(Arc::new(storage))
            }
            StorageConfig::Moka(config) => config.into_storage(),
            StorageConfig::File(config) => config.into_storage(),
        }
    }
}

impl Moka {
    #[cfg(feature = "moka")]
    fn into_storage(self) -> Result<Arc<dyn Storage>, ConfigError> {
        use stashbox_moka::MokaStorage;

        if self.max_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        let mut builder = MokaStorage::builder();
        if let Some(label) = self.label {
            builder = builder.label(label);
        }
        Ok(Arc::new(builder.max_entries(self.max_capacity).build()))
    }

    #[cfg(not(feature = "moka"))]
    fn into_storage(self) -> Result<Arc<dyn Storage>, ConfigError> {
        Err(ConfigError::StorageNotAvailable("Moka".to_string()))
    }
}

impl File {
    #[cfg(feature = "file")]
    fn into_storage(self) -> Result<Arc<dyn Storage>, ConfigError> {
        use stashbox_file::FileStorage;

        let mut builder = FileStorage::builder().path(&self.path);
        if let Some(label) = self.label {
            builder = builder.label(label);
        }
        let storage = builder.build().map_err(|e| ConfigError::StorageInit {
            name: "File".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "file"))]
    fn into_storage(self) -> Result<Arc<dyn Storage>, ConfigError> {
        Err(ConfigError::StorageNotAvailable("File".to_string()))
    }
}
