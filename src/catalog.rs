//! Type Registry Catalog
//!
//! Aggregates the base registry, the per-version overlays, the live-metadata
//! registry and the name resolver chain, and answers one question: which node
//! describes `name` at runtime version `v`?
//!
//! Resolution picks the newest overlay that (re)defines the name at or before
//! `v`; with no such overlay the base registry applies. Whatever the chosen
//! registry lacks is looked up in the live-metadata registry.
//!
//! The catalog is immutable once built and can be shared across threads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::index::{applicable_version, VersionedTypeIndex};
use crate::node::Node;
use crate::registry::SchemaRegistry;
use crate::resolver::ResolverChain;
use crate::version::SpecVersion;

/// Which registry a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "registry", content = "version", rename_all = "snake_case")]
pub enum NodeSource {
    Base,
    Versioned(SpecVersion),
    Runtime,
}

impl fmt::Display for NodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSource::Base => write!(f, "base"),
            NodeSource::Versioned(version) => write!(f, "overlay {}", version),
            NodeSource::Runtime => write!(f, "runtime metadata"),
        }
    }
}

/// A resolved node with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The name the node was found under
    pub canonical_name: String,
    pub source: NodeSource,
    pub node: Arc<Node>,
}

/// Version-aware type catalog
#[derive(Debug)]
pub struct TypeCatalog {
    base: SchemaRegistry,
    overlays: BTreeMap<SpecVersion, SchemaRegistry>,
    index: VersionedTypeIndex,
    runtime: SchemaRegistry,
    resolvers: ResolverChain,
}

impl TypeCatalog {
    /// Assemble a catalog and build its version index
    pub fn new(
        base: SchemaRegistry,
        overlays: BTreeMap<SpecVersion, SchemaRegistry>,
        runtime: SchemaRegistry,
        resolvers: ResolverChain,
    ) -> Self {
        let index = VersionedTypeIndex::build(&overlays);
        tracing::debug!(
            base_types = base.len(),
            overlays = overlays.len(),
            indexed_types = index.len(),
            runtime_types = runtime.len(),
            strategies = resolvers.len(),
            "assembled type catalog"
        );
        Self {
            base,
            overlays,
            index,
            runtime,
            resolvers,
        }
    }

    /// The node for `name` at `version`, or `None` if no registry has it
    pub fn node(&self, name: &str, version: impl Into<SpecVersion>) -> Option<Arc<Node>> {
        self.resolve(name, version).map(|resolution| resolution.node)
    }

    /// Like [`TypeCatalog::node`], also reporting where the node came from
    pub fn resolve(&self, name: &str, version: impl Into<SpecVersion>) -> Option<Resolution> {
        let version = version.into();

        // Registries are keyed by canonical names, so once the chain maps the
        // name onto an indexed one, that name is used for every lookup below.
        let (canonical, candidates) = match self.index.versions_of(name) {
            Some(versions) => (name.to_string(), versions),
            None => match self.resolvers.resolve(name, &self.index) {
                Some(resolved) => {
                    let versions = self.index.versions_of(&resolved).unwrap_or(&[]);
                    (resolved, versions)
                }
                None => (name.to_string(), &[][..]),
            },
        };

        let (source, registry) = self.select_registry(candidates, version);
        let found = registry
            .lookup(&canonical)
            .map(|node| (source, node))
            .or_else(|| self.runtime.lookup(&canonical).map(|node| (NodeSource::Runtime, node)));

        // Metadata may still know the name as it was asked for
        let (canonical, found) = match found {
            None if canonical != name => match self.runtime.lookup(name) {
                Some(node) => (name.to_string(), Some((NodeSource::Runtime, node))),
                None => (canonical, None),
            },
            found => (canonical, found),
        };

        match found {
            Some((source, node)) => {
                tracing::trace!(name, canonical = %canonical, %version, %source, "resolved node");
                Some(Resolution {
                    canonical_name: canonical,
                    source,
                    node,
                })
            }
            None => {
                tracing::trace!(name, canonical = %canonical, %version, "no node found");
                None
            }
        }
    }

    /// The newest candidate version ≤ `version`, falling back to the base
    /// registry when there is none or it has no recorded overlay.
    fn select_registry(
        &self,
        candidates: &[SpecVersion],
        version: SpecVersion,
    ) -> (NodeSource, &SchemaRegistry) {
        applicable_version(candidates, version)
            .and_then(|v| self.overlays.get(&v).map(|registry| (NodeSource::Versioned(v), registry)))
            .unwrap_or((NodeSource::Base, &self.base))
    }

    /// Overlay versions, ascending
    pub fn versions(&self) -> impl Iterator<Item = SpecVersion> + '_ {
        self.overlays.keys().copied()
    }

    /// Versions at which `name` is (re)defined, ascending
    pub fn versions_of(&self, name: &str) -> Option<&[SpecVersion]> {
        self.index.versions_of(name)
    }

    pub fn index(&self) -> &VersionedTypeIndex {
        &self.index
    }

    pub fn base(&self) -> &SchemaRegistry {
        &self.base
    }

    pub fn runtime(&self) -> &SchemaRegistry {
        &self.runtime
    }

    /// The overlay registered exactly at `version`
    pub fn registry(&self, version: SpecVersion) -> Option<&SchemaRegistry> {
        self.overlays.get(&version)
    }

    /// Every name known to any registry, sorted and deduplicated
    pub fn all_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .base
            .names()
            .chain(self.overlays.values().flat_map(|registry| registry.names()))
            .chain(self.runtime.names())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Field, Primitive};
    use crate::resolver::{KnownNames, NameResolver};

    fn struct_node(fields: &[&str]) -> Node {
        Node::Struct {
            fields: fields
                .iter()
                .map(|name| Field {
                    name: name.to_string(),
                    node: Node::primitive(Primitive::U32),
                })
                .collect(),
        }
    }

    fn registry(entries: Vec<(&str, Node)>) -> SchemaRegistry {
        SchemaRegistry::from_nodes(entries.into_iter().map(|(n, node)| (n.to_string(), node)))
    }

    fn catalog_with(resolvers: ResolverChain) -> TypeCatalog {
        let base = registry(vec![
            ("Balance", Node::primitive(Primitive::U128)),
            ("Account", struct_node(&["nonce"])),
        ]);
        let mut overlays = BTreeMap::new();
        overlays.insert(
            SpecVersion(100),
            registry(vec![("Account", struct_node(&["nonce", "free"]))]),
        );
        overlays.insert(
            SpecVersion(250),
            registry(vec![
                ("Account", struct_node(&["nonce", "free", "reserved"])),
                ("GenericCall", Node::generic("GenericCall")),
            ]),
        );
        let runtime = registry(vec![
            ("RuntimeOnly", Node::primitive(Primitive::U8)),
            ("Balance", Node::primitive(Primitive::U64)),
        ]);
        TypeCatalog::new(base, overlays, runtime, resolvers)
    }

    fn catalog() -> TypeCatalog {
        catalog_with(ResolverChain::standard())
    }

    #[test]
    fn test_version_brackets() {
        let catalog = catalog();
        assert_eq!(catalog.node("Account", 50u32).as_deref(), Some(&struct_node(&["nonce"])));
        assert_eq!(
            catalog.node("Account", 100u32).as_deref(),
            Some(&struct_node(&["nonce", "free"]))
        );
        assert_eq!(
            catalog.node("Account", 249u32).as_deref(),
            Some(&struct_node(&["nonce", "free"]))
        );
        assert_eq!(
            catalog.node("Account", 300u32).as_deref(),
            Some(&struct_node(&["nonce", "free", "reserved"]))
        );
    }

    #[test]
    fn test_sources() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("Account", 50u32).unwrap().source, NodeSource::Base);
        assert_eq!(
            catalog.resolve("Account", 150u32).unwrap().source,
            NodeSource::Versioned(SpecVersion(100))
        );
        assert_eq!(catalog.resolve("Balance", 9999u32).unwrap().source, NodeSource::Base);
        assert_eq!(
            catalog.resolve("RuntimeOnly", 1u32).unwrap().source,
            NodeSource::Runtime
        );
    }

    #[test]
    fn test_same_bracket_shares_node() {
        let catalog = catalog();
        let a = catalog.node("Account", 120u32).unwrap();
        let b = catalog.node("Account", 240u32).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let catalog = catalog();
        let resolution = catalog.resolve("account", 150u32).unwrap();
        assert_eq!(resolution.canonical_name, "Account");
        assert_eq!(Some(resolution.node), catalog.node("Account", 150u32));
    }

    #[test]
    fn test_base_wins_over_runtime() {
        let catalog = catalog();
        assert_eq!(
            catalog.node("Balance", 9999u32).as_deref(),
            Some(&Node::primitive(Primitive::U128))
        );
    }

    #[test]
    fn test_runtime_fallback_and_miss() {
        let catalog = catalog();
        assert_eq!(
            catalog.node("RuntimeOnly", 0u32).as_deref(),
            Some(&Node::primitive(Primitive::U8))
        );
        assert!(catalog.node("Nowhere", 300u32).is_none());
    }

    #[test]
    fn test_generic_overlay_entries_are_not_selected() {
        let catalog = catalog();
        assert!(catalog.versions_of("GenericCall").is_none());
        // Not indexed, so the lookup lands in the base registry, which lacks it
        assert!(catalog.node("GenericCall", 300u32).is_none());
    }

    #[test]
    fn test_resolution_without_strategies() {
        let catalog = catalog_with(ResolverChain::empty());
        assert!(catalog.node("account", 150u32).is_none());
        assert!(catalog.node("Account", 150u32).is_some());
    }

    #[test]
    fn test_missing_overlay_falls_back_to_base() {
        struct Always(&'static str);
        impl NameResolver for Always {
            fn resolve(&self, _name: &str, _known: &dyn KnownNames) -> Option<String> {
                Some(self.0.to_string())
            }
            fn label(&self) -> &'static str {
                "always"
            }
        }

        // Resolves onto a name the index does not know: no candidates, base applies
        let catalog = catalog_with(ResolverChain::empty().with(Always("Balance")));
        let resolution = catalog.resolve("Anything", 300u32).unwrap();
        assert_eq!(resolution.canonical_name, "Balance");
        assert_eq!(resolution.source, NodeSource::Base);
    }

    #[test]
    fn test_runtime_fallback_tries_requested_name() {
        struct Elsewhere;
        impl NameResolver for Elsewhere {
            fn resolve(&self, _name: &str, _known: &dyn KnownNames) -> Option<String> {
                Some("Unregistered".to_string())
            }
            fn label(&self) -> &'static str {
                "elsewhere"
            }
        }

        let catalog = catalog_with(ResolverChain::empty().with(Elsewhere));
        let resolution = catalog.resolve("RuntimeOnly", 300u32).unwrap();
        assert_eq!(resolution.canonical_name, "RuntimeOnly");
        assert_eq!(resolution.source, NodeSource::Runtime);
        assert_eq!(*resolution.node, Node::primitive(Primitive::U8));

        assert!(catalog.node("Nowhere", 300u32).is_none());
    }

    #[test]
    fn test_accessors() {
        let catalog = catalog();
        assert_eq!(
            catalog.versions().collect::<Vec<_>>(),
            vec![SpecVersion(100), SpecVersion(250)]
        );
        assert!(catalog.registry(SpecVersion(100)).is_some());
        assert!(catalog.registry(SpecVersion(101)).is_none());
        assert_eq!(
            catalog.all_names(),
            vec!["Account", "Balance", "GenericCall", "RuntimeOnly"]
        );
    }

    #[test]
    fn test_catalog_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeCatalog>();

        let catalog = Arc::new(catalog());
        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || catalog.node("Account", 100 * i).is_some())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
