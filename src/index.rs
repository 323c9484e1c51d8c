//! Versioned Type Index
//!
//! For every type name defined in a version overlay, the ascending list of
//! versions at which that name was (re)defined. Built once, from the overlays,
//! when the catalog is assembled.

use std::collections::BTreeMap;

use crate::registry::SchemaRegistry;
use crate::resolver::KnownNames;
use crate::version::SpecVersion;

/// name → ascending versions defining that name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionedTypeIndex {
    versions: BTreeMap<String, Vec<SpecVersion>>,
}

impl VersionedTypeIndex {
    /// Scan overlays in ascending version order.
    ///
    /// Generic placeholders are not definitions and are skipped. A version is
    /// only appended when it differs from the last one recorded for the name.
    pub fn build(overlays: &BTreeMap<SpecVersion, SchemaRegistry>) -> Self {
        let mut versions: BTreeMap<String, Vec<SpecVersion>> = BTreeMap::new();

        // BTreeMap iteration is ascending by key
        for (&version, registry) in overlays {
            for (name, node) in registry.iter() {
                if node.is_generic() {
                    continue;
                }
                let list = versions.entry(name.to_string()).or_default();
                if list.last() != Some(&version) {
                    list.push(version);
                }
            }
        }

        Self { versions }
    }

    /// Versions at which `name` is defined, ascending
    pub fn versions_of(&self, name: &str) -> Option<&[SpecVersion]> {
        self.versions.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.versions.contains_key(name)
    }

    /// Indexed names in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SpecVersion])> {
        self.versions
            .iter()
            .map(|(name, versions)| (name.as_str(), versions.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl KnownNames for VersionedTypeIndex {
    fn contains_name(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn known_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.names())
    }
}

/// Newest version in `versions` (ascending) that is ≤ `at`
pub fn applicable_version(versions: &[SpecVersion], at: SpecVersion) -> Option<SpecVersion> {
    versions.iter().rev().find(|&&v| v <= at).copied()
}
