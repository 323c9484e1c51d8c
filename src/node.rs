//! Schema nodes
//!
//! A [`Node`] describes how one type is laid out on the wire. The catalog never
//! looks inside a node except to ask [`Node::is_generic`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar types understood natively by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
}

impl Primitive {
    /// Parse a primitive from its type-expression spelling
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "str" | "Str" | "String" | "Text" => Primitive::Str,
            "u8" => Primitive::U8,
            "u16" => Primitive::U16,
            "u32" => Primitive::U32,
            "u64" => Primitive::U64,
            "u128" => Primitive::U128,
            "u256" => Primitive::U256,
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "i128" => Primitive::I128,
            "i256" => Primitive::I256,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::U256 => "u256",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::I256 => "i256",
        }
    }

    /// Whether this primitive can back a bit-flag set
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Primitive::U8
                | Primitive::U16
                | Primitive::U32
                | Primitive::U64
                | Primitive::U128
                | Primitive::U256
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub node: Node,
}

/// An enum variant with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    /// `Node::Null` for variants without data
    pub payload: Node,
}

/// A flag of a bit set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFlag {
    pub name: String,
    pub bits: u64,
}

/// How to encode/decode one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Primitive { primitive: Primitive },
    Null,
    /// A named type resolved through the catalog at codec time
    Reference { name: String },
    Vector { element: Box<Node> },
    Option { inner: Box<Node> },
    Compact { inner: Box<Node> },
    FixedArray { element: Box<Node>, length: usize },
    Tuple { elements: Vec<Node> },
    Map { key: Box<Node>, value: Box<Node> },
    Result { ok: Box<Node>, err: Box<Node> },
    Struct { fields: Vec<Field> },
    Enum { variants: Vec<Variant> },
    /// C-like enum, encoded as the variant index only
    ValueEnum { values: Vec<String> },
    Set { value_type: Primitive, flags: Vec<SetFlag> },
    /// Parametric placeholder, not a concrete definition
    Generic { name: String },
}

impl Node {
    pub fn primitive(primitive: Primitive) -> Self {
        Node::Primitive { primitive }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Node::Reference { name: name.into() }
    }

    pub fn vector(element: Node) -> Self {
        Node::Vector {
            element: Box::new(element),
        }
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Node::Generic { name: name.into() }
    }

    /// Generic nodes are excluded from version indexing.
    pub fn is_generic(&self) -> bool {
        matches!(self, Node::Generic { .. })
    }

    /// Short label of the node kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Primitive { .. } => "primitive",
            Node::Null => "null",
            Node::Reference { .. } => "reference",
            Node::Vector { .. } => "vector",
            Node::Option { .. } => "option",
            Node::Compact { .. } => "compact",
            Node::FixedArray { .. } => "fixed_array",
            Node::Tuple { .. } => "tuple",
            Node::Map { .. } => "map",
            Node::Result { .. } => "result",
            Node::Struct { .. } => "struct",
            Node::Enum { .. } => "enum",
            Node::ValueEnum { .. } => "value_enum",
            Node::Set { .. } => "set",
            Node::Generic { .. } => "generic",
        }
    }
}
