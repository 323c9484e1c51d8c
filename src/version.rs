//! Runtime spec versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Protocol revision at or after which a schema overlay applies.
///
/// Versions are plain unsigned integers (the runtime `spec_version`) and form a
/// total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecVersion(pub u32);

impl SpecVersion {
    /// The lowest possible version
    pub const MIN: SpecVersion = SpecVersion(0);

    /// The highest possible version, useful for "latest" queries
    pub const MAX: SpecVersion = SpecVersion(u32::MAX);

    /// Parse a version string, accepting an optional leading `v`
    pub fn parse(version_str: &str) -> Result<Self, ParseIntError> {
        let version_str = version_str.trim();
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        version_str.parse().map(SpecVersion)
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SpecVersion {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u32> for SpecVersion {
    fn from(version: u32) -> Self {
        SpecVersion(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(SpecVersion::parse("9430").unwrap(), SpecVersion(9430));
        assert_eq!(SpecVersion::parse("v9430").unwrap(), SpecVersion(9430));
        assert!(SpecVersion::parse("latest").is_err());
        assert!(SpecVersion::parse("-1").is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(SpecVersion(100) < SpecVersion(250));
        assert!(SpecVersion::MIN <= SpecVersion(0));
        assert!(SpecVersion::MAX > SpecVersion(1_000_000));
    }
}
