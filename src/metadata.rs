//! Live Runtime Metadata
//!
//! A running network reports the schema it currently executes as a portable
//! type registry: a flat list of types addressed by numeric id, each with an
//! optional module path and a structural definition.
//!
//! ```json
//! {
//!   "spec_version": 9430,
//!   "types": [
//!     { "id": 0, "path": ["sp_core", "crypto", "AccountId32"],
//!       "def": { "composite": { "fields": [{ "type": 1, "typeName": "[u8; 32]" }] } } },
//!     { "id": 1, "def": { "array": { "len": 32, "type": 2 } } },
//!     { "id": 2, "def": { "primitive": "u8" } }
//!   ]
//! }
//! ```
//!
//! [`RuntimeMetadata::to_registry`] turns this into the catalog's last-resort
//! registry. Pathed types are registered under their last path segment and
//! their full `::`-joined path.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{CatalogError, Result};
use crate::node::{Field, Node, Primitive, Variant};
use crate::registry::SchemaRegistry;

/// Metadata reported by a running network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    /// Runtime version the metadata was captured at
    #[serde(default)]
    pub spec_version: Option<u32>,
    #[serde(default)]
    pub types: Vec<PortableType>,
}

/// One entry of the portable type registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortableType {
    pub id: u32,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub params: Vec<TypeParam>,
    pub def: TypeDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeDef {
    Composite(CompositeDef),
    Variant(VariantDef),
    Sequence(ElementDef),
    Array(ArrayDef),
    Tuple(Vec<u32>),
    Primitive(String),
    Compact(ElementDef),
    BitSequence(BitSequenceDef),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeDef {
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: u32,
    #[serde(default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantDef {
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    pub index: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDef {
    #[serde(rename = "type")]
    pub ty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayDef {
    pub len: u32,
    #[serde(rename = "type")]
    pub ty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitSequenceDef {
    pub bit_store_type: u32,
    pub bit_order_type: u32,
}

impl RuntimeMetadata {
    /// Metadata with no types; its registry is empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the live-metadata registry.
    ///
    /// Short names collide often (`Call`, `Event`, `Error` exist in every
    /// pallet); the first type with a given short name keeps it, the full path
    /// is always registered.
    pub fn to_registry(&self) -> Result<SchemaRegistry> {
        let lookup: HashMap<u32, &PortableType> = self.types.iter().map(|t| (t.id, t)).collect();
        let converter = Converter { lookup: &lookup };

        let mut full_paths = Vec::new();
        let mut short_names = Vec::new();
        for ty in self.types.iter().filter(|t| !t.path.is_empty()) {
            let mut visiting = HashSet::from([ty.id]);
            let node = converter.def_to_node(ty, &mut visiting)?;
            if let [_, .., short] = ty.path.as_slice() {
                short_names.push((short.clone(), node.clone()));
            }
            full_paths.push((ty.path.join("::"), node));
        }

        // Full paths go first so a short name never shadows a full path
        let registry = SchemaRegistry::from_nodes(full_paths.into_iter().chain(short_names));
        tracing::debug!(
            types = self.types.len(),
            registered = registry.len(),
            spec_version = ?self.spec_version,
            "built live metadata registry"
        );
        Ok(registry)
    }
}

struct Converter<'a> {
    lookup: &'a HashMap<u32, &'a PortableType>,
}

impl Converter<'_> {
    fn get(&self, id: u32) -> Result<&PortableType> {
        self.lookup
            .get(&id)
            .copied()
            .ok_or_else(|| CatalogError::invalid_format(format!("metadata references unknown type id {}", id)))
    }

    /// Node for a type used from inside another type
    fn reference(&self, id: u32, visiting: &mut HashSet<u32>) -> Result<Node> {
        let ty = self.get(id)?;
        if !ty.path.is_empty() {
            return Ok(Node::reference(ty.path.join("::")));
        }
        // Anonymous types are inlined; a cycle through them is cut
        if !visiting.insert(id) {
            return Ok(Node::reference(format!("#{}", id)));
        }
        let node = self.def_to_node(ty, visiting);
        visiting.remove(&id);
        node
    }

    fn def_to_node(&self, ty: &PortableType, visiting: &mut HashSet<u32>) -> Result<Node> {
        let node = match &ty.def {
            TypeDef::Composite(composite) => self.fields_to_node(&composite.fields, visiting)?,
            TypeDef::Variant(def) => {
                let mut entries: Vec<&VariantEntry> = def.variants.iter().collect();
                entries.sort_by_key(|v| v.index);
                let variants = entries
                    .into_iter()
                    .map(|v| {
                        Ok(Variant {
                            name: v.name.clone(),
                            payload: self.fields_to_node(&v.fields, visiting)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Node::Enum { variants }
            }
            TypeDef::Sequence(seq) => Node::vector(self.reference(seq.ty, visiting)?),
            TypeDef::Array(array) => Node::FixedArray {
                element: Box::new(self.reference(array.ty, visiting)?),
                length: array.len as usize,
            },
            TypeDef::Tuple(ids) => {
                if ids.is_empty() {
                    Node::Null
                } else {
                    let elements = ids
                        .iter()
                        .map(|&id| self.reference(id, visiting))
                        .collect::<Result<Vec<_>>>()?;
                    Node::Tuple { elements }
                }
            }
            TypeDef::Primitive(name) => {
                let primitive = Primitive::from_name(name).ok_or_else(|| {
                    CatalogError::invalid_format(format!("unknown metadata primitive {:?}", name))
                })?;
                Node::primitive(primitive)
            }
            TypeDef::Compact(inner) => Node::Compact {
                inner: Box::new(self.reference(inner.ty, visiting)?),
            },
            TypeDef::BitSequence(bits) => Node::vector(self.reference(bits.bit_store_type, visiting)?),
        };
        Ok(node)
    }

    /// Named fields make a struct, unnamed ones a tuple (one unnamed field is
    /// a transparent wrapper)
    fn fields_to_node(&self, fields: &[FieldDef], visiting: &mut HashSet<u32>) -> Result<Node> {
        if fields.is_empty() {
            return Ok(Node::Null);
        }
        if fields.iter().all(|f| f.name.is_some()) {
            let fields = fields
                .iter()
                .map(|f| {
                    Ok(Field {
                        name: f.name.clone().unwrap_or_default(),
                        node: self.reference(f.ty, visiting)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Node::Struct { fields });
        }
        let mut elements = fields
            .iter()
            .map(|f| self.reference(f.ty, visiting))
            .collect::<Result<Vec<_>>>()?;
        if elements.len() == 1 {
            return Ok(elements.remove(0));
        }
        Ok(Node::Tuple { elements })
    }
}
