//! Namespaced cache keys.
//!
//! Every entry lives under a `(namespace, key)` pair. The namespace isolates
//! one logical cache from another inside a shared storage, and is the unit
//! that [`clear`](https://docs.rs/stashbox) operates on.
//!
//! ```
//! use stashbox_core::CacheKey;
//!
//! let key = CacheKey::new("forum-alerts", "user:42");
//! assert_eq!(key.namespace(), "forum-alerts");
//! assert_eq!(key.key(), "user:42");
//! assert_eq!(format!("{}", key), "forum-alerts:user:42");
//! ```

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// A cache key scoped to a namespace.
///
/// Both parts are [`SmolStr`], so short keys are stored inline and cloning
/// is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    namespace: SmolStr,
    key: SmolStr,
}

impl CacheKey {
    /// Creates a key inside the given namespace.
    pub fn new(namespace: impl Into<SmolStr>, key: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Returns the namespace part.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the caller-chosen key part.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if this key lives in `namespace`.
    #[inline]
    pub fn belongs_to(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}
