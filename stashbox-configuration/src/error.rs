use thiserror::Error;

/// Errors raised while loading configuration or building from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed into a configuration.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The configuration selects a storage this build doesn't include.
    #[error("storage {0} is not available, enable the matching crate feature")]
    StorageNotAvailable(String),

    /// The selected storage failed to initialize.
    #[error("storage {name} failed to initialize: {reason}")]
    StorageInit {
        /// Storage type name.
        name: String,
        /// Underlying failure.
        reason: String,
    },

    /// A value is out of its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
