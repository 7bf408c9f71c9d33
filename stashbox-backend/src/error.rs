//! Error types for storage operations.

use thiserror::Error;

/// Error type for storage operations.
///
/// The TTL cache absorbs these on reads (a failed read is a miss) and
/// surfaces them on writes.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Internal storage error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] serde_json::Error),
}

impl StorageError {
    /// Wraps any error as [`StorageError::InternalError`].
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InternalError(Box::new(error))
    }
}
