//! Schema Registry
//!
//! An immutable name → node mapping scoped to one schema revision (or to the
//! base set). Nodes are shared through `Arc`, so the same node can be handed
//! out to many codec calls without copying.

use std::collections::HashMap;
use std::sync::Arc;

use crate::checksum::Checksum;
use crate::definition::parse_type_map;
use crate::error::Result;
use crate::node::Node;
use crate::value::Value;

/// Immutable mapping from type name to schema node
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    nodes: HashMap<String, Arc<Node>>,
}

impl SchemaRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from already-parsed nodes.
    ///
    /// When a name repeats, the first node wins.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (String, Node)>,
    {
        let mut map = HashMap::new();
        for (name, node) in nodes {
            map.entry(name).or_insert_with(|| Arc::new(node));
        }
        Self { nodes: map }
    }

    /// Build a registry from a type map document (`{ "Name": definition, ... }`)
    pub fn from_type_map(types: &Value) -> Result<Self> {
        Ok(Self::from_nodes(parse_type_map(types)?))
    }

    /// Look up a node by its exact name
    pub fn lookup(&self, name: &str) -> Option<Arc<Node>> {
        self.nodes.get(name).cloned()
    }

    /// Borrow a node by its exact name
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All canonical names defined here, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All names with their nodes, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Content fingerprint of this registry
    pub fn fingerprint(&self) -> Checksum {
        Checksum::of_nodes(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Primitive;

    #[test]
    fn test_create_registry() {
        let registry = SchemaRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.lookup("Balance").is_none());
    }

    #[test]
    fn test_from_type_map() {
        let types = Value::from_json_str(
            r#"{"Balance": "u128", "AccountId": "[u8; 32]", "Index": "u32"}"#,
        )
        .unwrap();
        let registry = SchemaRegistry::from_type_map(&types).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.lookup("Balance").as_deref(),
            Some(&Node::primitive(Primitive::U128))
        );
        // Exact names only
        assert!(registry.lookup("balance").is_none());

        let mut names: Vec<&str> = registry.names().collect();
        names.sort();
        assert_eq!(names, vec!["AccountId", "Balance", "Index"]);
    }

    #[test]
    fn test_first_definition_wins() {
        let registry = SchemaRegistry::from_nodes(vec![
            ("Balance".to_string(), Node::primitive(Primitive::U128)),
            ("Balance".to_string(), Node::primitive(Primitive::U64)),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Balance"), Some(&Node::primitive(Primitive::U128)));
    }

    #[test]
    fn test_lookup_shares_nodes() {
        let registry = SchemaRegistry::from_nodes(vec![(
            "Balance".to_string(),
            Node::primitive(Primitive::U128),
        )]);
        let a = registry.lookup("Balance").unwrap();
        let b = registry.lookup("Balance").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_malformed_document() {
        let not_a_map = Value::from_json_str(r#"["Balance"]"#).unwrap();
        assert!(SchemaRegistry::from_type_map(&not_a_map).is_err());

        let bad_definition = Value::from_json_str(r#"{"Balance": 12}"#).unwrap();
        assert!(SchemaRegistry::from_type_map(&bad_definition).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = SchemaRegistry::from_type_map(&Value::from_json_str(r#"{"Balance": "u128"}"#).unwrap())
            .unwrap();
        let b = SchemaRegistry::from_type_map(&Value::from_json_str(r#"{"Balance": "u64"}"#).unwrap())
            .unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
