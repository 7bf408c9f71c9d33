use stashbox_backend::StorageError;
use thiserror::Error;

/// Errors that can occur when using [`FileStorage`](crate::FileStorage).
#[derive(Debug, Error)]
pub enum FileStorageError {
    /// An I/O error occurred while accessing a namespace file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A namespace document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provided configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<FileStorageError> for StorageError {
    fn from(error: FileStorageError) -> Self {
        match error {
            FileStorageError::Json(e) => StorageError::FormatError(e),
            other => StorageError::internal(other),
        }
    }
}
