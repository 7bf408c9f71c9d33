//! Storage label type.
//!
//! `StorageLabel` names a storage implementation in metrics and log fields.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a storage backend, e.g. `"memory"`, `"moka"`, `"file"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorageLabel(SmolStr);

impl StorageLabel {
    /// Creates a new label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StorageLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for StorageLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for StorageLabel {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}
