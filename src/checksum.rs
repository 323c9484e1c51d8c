//! Registry fingerprints
//!
//! A fingerprint identifies the exact set of definitions a registry was built
//! from, so logs and reports can tell two loaded schema revisions apart.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::node::Node;

/// SHA256 fingerprint of registry content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Fingerprint a set of named nodes.
    ///
    /// Entries are hashed in name order, so the result does not depend on the
    /// order definitions appeared in the source document.
    pub fn of_nodes<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Node)>,
    {
        let mut entries: Vec<_> = nodes.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (name, node) in entries {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            // Node serialization cannot fail: no maps with non-string keys
            let canonical = serde_json::to_vec(node).unwrap_or_default();
            hasher.update(&canonical);
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
