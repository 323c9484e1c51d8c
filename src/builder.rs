//! Catalog construction from raw documents
//!
//! Inputs follow the type-registry JSON layout:
//!
//! ```json
//! // base document
//! { "types": { "Balance": "u128", "AccountId": "[u8; 32]" } }
//!
//! // network document
//! {
//!   "types": { "Address": "MultiAddress" },
//!   "versioning": [
//!     { "runtime_range": [100, 249], "types": { "Account": { "type": "struct", ... } } },
//!     { "runtime_range": [250, null], "types": { "Account": { ... } } }
//!   ]
//! }
//! ```
//!
//! The base document may also be a bare type map. Network-level `types`
//! replace base definitions of the same name.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::catalog::TypeCatalog;
use crate::definition::parse_type_map;
use crate::error::{CatalogError, Result};
use crate::metadata::RuntimeMetadata;
use crate::node::Node;
use crate::registry::SchemaRegistry;
use crate::resolver::{NormalizationRule, NormalizingResolver, RenameTableResolver, ResolverChain};
use crate::value::Value;
use crate::version::SpecVersion;

/// Construction knobs
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Reject versioning entries that repeat a minimum version instead of
    /// merging them
    pub strict_versioning: bool,
    /// Extra rename-table entries (alias → canonical)
    pub aliases: HashMap<String, String>,
    /// Extra normalization rules, applied after the built-in ones
    pub rules: Vec<NormalizationRule>,
}

impl CatalogOptions {
    /// The resolver chain these options describe
    pub fn resolver_chain(&self) -> ResolverChain {
        ResolverChain::from_parts(
            RenameTableResolver::with_aliases(self.aliases.clone()),
            NormalizingResolver::with_rules(self.rules.iter().cloned()),
        )
    }
}

impl TypeCatalog {
    /// Build a catalog from a base document, a network versioned document and
    /// live metadata, with default options
    pub fn from_documents(base: &Value, network: &Value, metadata: &RuntimeMetadata) -> Result<Self> {
        Self::from_documents_with(base, network, metadata, &CatalogOptions::default())
    }

    /// Build a catalog from documents
    pub fn from_documents_with(
        base: &Value,
        network: &Value,
        metadata: &RuntimeMetadata,
        options: &CatalogOptions,
    ) -> Result<Self> {
        let overlays = parse_versioning(network, options.strict_versioning)?
            .into_iter()
            .map(|(version, nodes)| (version, SchemaRegistry::from_nodes(nodes)))
            .collect::<BTreeMap<_, _>>();

        let base_registry = build_base_registry(base, network)?;
        let runtime = metadata.to_registry()?;

        for (version, registry) in &overlays {
            tracing::debug!(
                %version,
                types = registry.len(),
                fingerprint = registry.fingerprint().short(),
                "loaded schema overlay"
            );
        }

        Ok(TypeCatalog::new(base_registry, overlays, runtime, options.resolver_chain()))
    }

    /// Build a catalog from JSON text
    pub fn from_json(base: &str, network: &str, metadata: &str) -> Result<Self> {
        Self::from_documents(
            &Value::from_json_str(base)?,
            &Value::from_json_str(network)?,
            &RuntimeMetadata::from_json_str(metadata)?,
        )
    }
}

/// The type map of a base document: its `types` mapping, or the document itself
pub fn base_type_map(base: &Value) -> Result<&Value> {
    if base.as_mapping().is_none() {
        return Err(CatalogError::invalid_format(format!(
            "base document must be a mapping, found {}",
            base.kind()
        )));
    }
    match base.get("types") {
        Some(types @ Value::Mapping(_)) => Ok(types),
        _ => Ok(base),
    }
}

/// Base definitions overlaid with the network document's top-level `types`
fn build_base_registry(base: &Value, network: &Value) -> Result<SchemaRegistry> {
    let mut nodes = match network.get("types") {
        Some(types) => parse_type_map(types)?,
        None => Vec::new(),
    };
    // First definition wins, so network entries shadow base entries
    nodes.extend(parse_type_map(base_type_map(base)?)?);
    Ok(SchemaRegistry::from_nodes(nodes))
}

/// Group the `versioning` entries by minimum version.
///
/// Entries sharing a minimum version are merged in document order; the
/// registry built from the merged list keeps the first definition of a name.
pub fn parse_versioning(
    network: &Value,
    strict: bool,
) -> Result<BTreeMap<SpecVersion, Vec<(String, Node)>>> {
    let entries = match network.get("versioning") {
        None | Some(Value::Null) => return Err(CatalogError::MissingVersioning),
        Some(Value::Sequence(entries)) => entries,
        Some(other) => {
            return Err(CatalogError::invalid_format(format!(
                "\"versioning\" must be a sequence, found {}",
                other.kind()
            )))
        }
    };

    let mut grouped: BTreeMap<SpecVersion, Vec<(String, Node)>> = BTreeMap::new();
    for (position, entry) in entries.iter().enumerate() {
        let version = minimum_version(entry, position)?;
        let types = entry.get("types").ok_or_else(|| {
            CatalogError::invalid_format(format!("versioning entry {} has no \"types\"", position))
        })?;
        let nodes = parse_type_map(types)?;

        match grouped.entry(version) {
            Entry::Occupied(_) if strict => {
                return Err(CatalogError::DuplicatedVersioning { version });
            }
            Entry::Occupied(mut existing) => {
                tracing::debug!(%version, added = nodes.len(), "merging versioning entries");
                existing.get_mut().extend(nodes);
            }
            Entry::Vacant(slot) => {
                slot.insert(nodes);
            }
        }
    }
    Ok(grouped)
}

/// First element of `runtime_range`
fn minimum_version(entry: &Value, position: usize) -> Result<SpecVersion> {
    let invalid = |reason: &str| {
        CatalogError::invalid_format(format!("versioning entry {}: {}", position, reason))
    };

    let range = entry
        .get("runtime_range")
        .and_then(Value::as_sequence)
        .ok_or_else(|| invalid("missing \"runtime_range\" list"))?;
    let first = range.first().ok_or_else(|| invalid("empty \"runtime_range\""))?;
    let version = first
        .as_u64()
        .ok_or_else(|| invalid("minimum version must be an unsigned integer"))?;
    let version = u32::try_from(version).map_err(|_| invalid("minimum version out of range"))?;
    Ok(SpecVersion(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Primitive;

    fn doc(json: &str) -> Value {
        Value::from_json_str(json).unwrap()
    }

    #[test]
    fn test_missing_versioning() {
        let result = parse_versioning(&doc(r#"{"types": {}}"#), false);
        assert!(matches!(result, Err(CatalogError::MissingVersioning)));

        let result = parse_versioning(&doc(r#"{"versioning": null}"#), false);
        assert!(matches!(result, Err(CatalogError::MissingVersioning)));

        let result = parse_versioning(&doc(r#"{"versioning": {}}"#), false);
        assert!(matches!(result, Err(CatalogError::InvalidFormat(_))));
    }

    #[test]
    fn test_merge_same_minimum_version() {
        let network = doc(
            r#"{"versioning": [
                {"runtime_range": [100, null], "types": {"Account": "u32", "Index": "u32"}},
                {"runtime_range": [100, 200], "types": {"Account": "u64", "Nonce": "u64"}}
            ]}"#,
        );
        let grouped = parse_versioning(&network, false).unwrap();
        assert_eq!(grouped.len(), 1);

        let registry = SchemaRegistry::from_nodes(grouped[&SpecVersion(100)].clone());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("Account"), Some(&Node::primitive(Primitive::U32)));
        assert_eq!(registry.get("Nonce"), Some(&Node::primitive(Primitive::U64)));
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let network = doc(
            r#"{"versioning": [
                {"runtime_range": [100, null], "types": {}},
                {"runtime_range": [100, null], "types": {}}
            ]}"#,
        );
        assert!(matches!(
            parse_versioning(&network, true),
            Err(CatalogError::DuplicatedVersioning { version: SpecVersion(100) })
        ));
    }

    #[test]
    fn test_malformed_entries() {
        for json in [
            r#"{"versioning": ["oops"]}"#,
            r#"{"versioning": [{"types": {}}]}"#,
            r#"{"versioning": [{"runtime_range": [], "types": {}}]}"#,
            r#"{"versioning": [{"runtime_range": [-1], "types": {}}]}"#,
            r#"{"versioning": [{"runtime_range": [5000000000], "types": {}}]}"#,
            r#"{"versioning": [{"runtime_range": [1]}]}"#,
        ] {
            assert!(
                matches!(parse_versioning(&doc(json), false), Err(CatalogError::InvalidFormat(_))),
                "expected InvalidFormat for {}",
                json
            );
        }
    }

    #[test]
    fn test_base_type_map_shapes() {
        let wrapped = doc(r#"{"types": {"Balance": "u128"}}"#);
        assert_eq!(base_type_map(&wrapped).unwrap().get("Balance"), Some(&Value::from("u128")));

        let bare = doc(r#"{"Balance": "u128"}"#);
        assert_eq!(base_type_map(&bare).unwrap(), &bare);

        assert!(base_type_map(&doc("[1, 2]")).is_err());
    }

    #[test]
    fn test_network_types_override_base() {
        let base = doc(r#"{"types": {"Balance": "u128", "Index": "u32"}}"#);
        let network = doc(r#"{"types": {"Balance": "u64"}, "versioning": []}"#);
        let catalog =
            TypeCatalog::from_documents(&base, &network, &RuntimeMetadata::empty()).unwrap();
        assert_eq!(
            catalog.node("Balance", 1u32).as_deref(),
            Some(&Node::primitive(Primitive::U64))
        );
        assert_eq!(
            catalog.node("Index", 1u32).as_deref(),
            Some(&Node::primitive(Primitive::U32))
        );
    }

    #[test]
    fn test_options_extend_resolvers() {
        let base = doc(r#"{"types": {}}"#);
        let network = doc(
            r#"{"versioning": [{"runtime_range": [10], "types": {"Balance": "u128"}}]}"#,
        );
        let options = CatalogOptions {
            aliases: HashMap::from([("Amount".to_string(), "Balance".to_string())]),
            rules: vec![NormalizationRule::new(r"^Raw", "").unwrap()],
            ..CatalogOptions::default()
        };
        let catalog =
            TypeCatalog::from_documents_with(&base, &network, &RuntimeMetadata::empty(), &options)
                .unwrap();
        assert!(catalog.node("Amount", 10u32).is_some());
        assert!(catalog.node("RawBalance", 10u32).is_some());
        assert!(catalog.node("Amount", 9u32).is_none());
    }
}
