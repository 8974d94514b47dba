//! Entity version for optimistic concurrency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic per-entity version.
///
/// A repository update succeeds only when the stored version equals the
/// version the caller loaded; the stored version is then incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version of a freshly created, not yet persisted entity.
    pub fn initial() -> Self {
        Self(1)
    }

    /// Creates a version from its raw value.
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_version_is_one() {
        assert_eq!(Version::initial().as_u64(), 1);
    }

    #[test]
    fn next_increments() {
        assert_eq!(Version::initial().next(), Version::from_u64(2));
    }

    #[test]
    fn displays_with_prefix() {
        assert_eq!(Version::from_u64(7).to_string(), "v7");
    }
}
