//! Type Definition Parsing
//!
//! Turns type-registry definitions into [`Node`]s. A definition is either a
//! type expression string (`"Vec<u8>"`, `"[u8; 32]"`, `"(AccountId, Balance)"`)
//! or a mapping with a `type` key:
//!
//! ```json
//! { "type": "struct", "type_mapping": [["nonce", "u32"], ["data", "AccountData"]] }
//! { "type": "enum", "type_mapping": [["Free", "Null"], ["Locked", "Balance"]] }
//! { "type": "enum", "value_list": ["Normal", "Operational"] }
//! { "type": "set", "value_type": "u64", "value_list": { "Display": 1, "Legal": 2 } }
//! { "type": "generic" }
//! ```

use crate::error::{CatalogError, Result};
use crate::node::{Field, Node, Primitive, SetFlag, Variant};
use crate::value::Value;

/// Parse the definition of type `name`
pub fn parse_definition(name: &str, definition: &Value) -> Result<Node> {
    match definition {
        Value::String(expr) => {
            parse_type_expr(expr).map_err(|reason| CatalogError::invalid_definition(name, reason))
        }
        Value::Mapping(_) => parse_composite(name, definition),
        other => Err(CatalogError::invalid_definition(
            name,
            format!("expected string or mapping, found {}", other.kind()),
        )),
    }
}

/// Parse every entry of a type map, in document order
pub fn parse_type_map(types: &Value) -> Result<Vec<(String, Node)>> {
    let entries = types.as_mapping().ok_or_else(|| {
        CatalogError::invalid_format(format!("type map must be a mapping, found {}", types.kind()))
    })?;

    entries
        .iter()
        .map(|(name, definition)| Ok((name.clone(), parse_definition(name, definition)?)))
        .collect()
}

fn parse_composite(name: &str, definition: &Value) -> Result<Node> {
    let kind = definition
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::invalid_definition(name, "missing \"type\" key"))?;

    match kind {
        "struct" => {
            let pairs = type_mapping(name, definition)?;
            let fields = pairs
                .into_iter()
                .map(|(field, node)| Field { name: field, node })
                .collect();
            Ok(Node::Struct { fields })
        }
        "enum" => {
            if definition.get("type_mapping").is_some() {
                let pairs = type_mapping(name, definition)?;
                let variants = pairs
                    .into_iter()
                    .map(|(variant, payload)| Variant { name: variant, payload })
                    .collect();
                return Ok(Node::Enum { variants });
            }
            let values = definition
                .get("value_list")
                .and_then(Value::as_sequence)
                .ok_or_else(|| {
                    CatalogError::invalid_definition(name, "enum needs \"type_mapping\" or \"value_list\"")
                })?
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        CatalogError::invalid_definition(name, "enum value_list entries must be strings")
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::ValueEnum { values })
        }
        "set" => parse_set(name, definition),
        "generic" => Ok(Node::generic(name)),
        other => Err(CatalogError::invalid_definition(
            name,
            format!("unknown definition type {:?}", other),
        )),
    }
}

/// `type_mapping: [[name, expr], ...]`
fn type_mapping(name: &str, definition: &Value) -> Result<Vec<(String, Node)>> {
    let entries = definition
        .get("type_mapping")
        .and_then(Value::as_sequence)
        .ok_or_else(|| CatalogError::invalid_definition(name, "missing \"type_mapping\" list"))?;

    entries
        .iter()
        .map(|entry| {
            let (key, expr) = match entry.as_sequence() {
                Some([Value::String(key), Value::String(expr)]) => (key, expr),
                _ => {
                    return Err(CatalogError::invalid_definition(
                        name,
                        "type_mapping entries must be [name, type] string pairs",
                    ))
                }
            };
            let node = parse_type_expr(expr)
                .map_err(|reason| CatalogError::invalid_definition(name, reason))?;
            Ok((key.clone(), node))
        })
        .collect()
}

fn parse_set(name: &str, definition: &Value) -> Result<Node> {
    let value_type = definition
        .get("value_type")
        .and_then(Value::as_str)
        .and_then(Primitive::from_name)
        .filter(Primitive::is_unsigned)
        .ok_or_else(|| CatalogError::invalid_definition(name, "set needs an unsigned \"value_type\""))?;

    let flags = definition
        .get("value_list")
        .and_then(Value::as_mapping)
        .ok_or_else(|| CatalogError::invalid_definition(name, "set needs a \"value_list\" mapping"))?
        .iter()
        .map(|(flag, bits)| {
            let bits = bits.as_u64().ok_or_else(|| {
                CatalogError::invalid_definition(name, format!("set flag {} must be unsigned", flag))
            })?;
            Ok(SetFlag { name: flag.clone(), bits })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Node::Set { value_type, flags })
}

/// Parse a type expression into a node.
///
/// Unknown names become [`Node::Reference`]. Placeholders only come from an
/// explicit `{ "type": "generic" }` definition.
pub fn parse_type_expr(expr: &str) -> std::result::Result<Node, String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err("empty type expression".to_string());
    }
    if expr == "Null" || expr == "()" {
        return Ok(Node::Null);
    }

    if let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
        let elements = split_top_level(inner, ',')?
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(parse_type_expr)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if elements.is_empty() {
            return Ok(Node::Null);
        }
        return Ok(Node::Tuple { elements });
    }

    if let Some(inner) = expr.strip_prefix('[').and_then(|e| e.strip_suffix(']')) {
        let parts = split_top_level(inner, ';')?;
        let [element, length] = parts.as_slice() else {
            return Err(format!("fixed array {:?} must be [T; N]", expr));
        };
        let length = length
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("fixed array {:?} has a non-numeric length", expr))?;
        return Ok(Node::FixedArray {
            element: Box::new(parse_type_expr(element)?),
            length,
        });
    }

    if let Some(primitive) = Primitive::from_name(expr) {
        return Ok(Node::primitive(primitive));
    }

    // rejects unbalanced brackets such as `Vec<u8`
    split_top_level(expr, ',')?;

    // `<T as Trait>::Name` projections are names, not applications
    if !expr.starts_with('<') && expr.ends_with('>') {
        if let Some(open) = expr.find('<') {
            let head = expr[..open].trim();
            let args = split_top_level(&expr[open + 1..expr.len() - 1], ',')?;
            if let Some(node) = apply_constructor(head, &args)? {
                return Ok(node);
            }
        }
    }

    Ok(Node::reference(expr))
}

fn apply_constructor(head: &str, args: &[&str]) -> std::result::Result<Option<Node>, String> {
    let arity = match head {
        "Vec" | "BTreeSet" | "VecDeque" | "Option" | "Compact" | "Box" => 1,
        "BTreeMap" | "HashMap" | "Result" => 2,
        _ => return Ok(None),
    };
    if args.len() != arity {
        return Err(format!(
            "{} expects {} type argument(s), found {}",
            head,
            arity,
            args.len()
        ));
    }

    let first = parse_type_expr(args[0])?;
    let node = match head {
        "Vec" | "BTreeSet" | "VecDeque" => Node::vector(first),
        "Option" => Node::Option {
            inner: Box::new(first),
        },
        "Compact" => Node::Compact {
            inner: Box::new(first),
        },
        "Box" => first,
        "BTreeMap" | "HashMap" => Node::Map {
            key: Box::new(first),
            value: Box::new(parse_type_expr(args[1])?),
        },
        _ => Node::Result {
            ok: Box::new(first),
            err: Box::new(parse_type_expr(args[1])?),
        },
    };
    Ok(Some(node))
}

/// Split on `separator` outside of `<>`, `()` and `[]`
fn split_top_level(input: &str, separator: char) -> std::result::Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced brackets in {:?}", input))?;
            }
            c if c == separator && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("unbalanced brackets in {:?}", input));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> Node {
        parse_type_expr(s).unwrap()
    }

    #[test]
    fn test_primitives_and_references() {
        assert_eq!(expr("u128"), Node::primitive(Primitive::U128));
        assert_eq!(expr("Null"), Node::Null);
        assert_eq!(expr("()"), Node::Null);
        assert_eq!(expr("Balance"), Node::reference("Balance"));
        assert_eq!(expr("<T as Trait>::Moment"), Node::reference("<T as Trait>::Moment"));
        assert_eq!(expr("GenericAccountId"), Node::reference("GenericAccountId"));
        assert!(!expr("GenericMultiAddress").is_generic());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(expr("Vec<u8>"), Node::vector(Node::primitive(Primitive::U8)));
        assert_eq!(
            expr("Option<Compact<Balance>>"),
            Node::Option {
                inner: Box::new(Node::Compact {
                    inner: Box::new(Node::reference("Balance"))
                })
            }
        );
        assert_eq!(expr("Box<Call>"), Node::reference("Call"));
        assert_eq!(
            expr("BTreeMap<AccountId, Vec<(u32, Balance)>>"),
            Node::Map {
                key: Box::new(Node::reference("AccountId")),
                value: Box::new(Node::vector(Node::Tuple {
                    elements: vec![Node::primitive(Primitive::U32), Node::reference("Balance")]
                })),
            }
        );
        // Unknown applications stay opaque references
        assert_eq!(expr("Weight<T>"), Node::reference("Weight<T>"));
    }

    #[test]
    fn test_arrays_and_tuples() {
        assert_eq!(
            expr("[u8; 32]"),
            Node::FixedArray {
                element: Box::new(Node::primitive(Primitive::U8)),
                length: 32
            }
        );
        assert_eq!(
            expr("(AccountId, [u8; 4],)"),
            Node::Tuple {
                elements: vec![
                    Node::reference("AccountId"),
                    Node::FixedArray {
                        element: Box::new(Node::primitive(Primitive::U8)),
                        length: 4
                    }
                ]
            }
        );
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(parse_type_expr("").is_err());
        assert!(parse_type_expr("Vec<u8").is_err());
        assert!(parse_type_expr("[u8; many]").is_err());
        assert!(parse_type_expr("BTreeMap<u8>").is_err());
    }

    #[test]
    fn test_struct_and_enum_definitions() {
        let def = Value::from_json_str(
            r#"{"type": "struct", "type_mapping": [["nonce", "u32"], ["data", "AccountData"]]}"#,
        )
        .unwrap();
        match parse_definition("AccountInfo", &def).unwrap() {
            Node::Struct { fields } => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["nonce", "data"]);
                assert_eq!(fields[1].node, Node::reference("AccountData"));
            }
            other => panic!("Expected Struct, got {:?}", other),
        }

        let def = Value::from_json_str(
            r#"{"type": "enum", "type_mapping": [["Free", "Null"], ["Locked", "Balance"]]}"#,
        )
        .unwrap();
        match parse_definition("Status", &def).unwrap() {
            Node::Enum { variants } => {
                assert_eq!(variants.len(), 2);
                assert_eq!(variants[0].payload, Node::Null);
            }
            other => panic!("Expected Enum, got {:?}", other),
        }

        let def = Value::from_json_str(r#"{"type": "enum", "value_list": ["Normal", "Operational"]}"#)
            .unwrap();
        assert_eq!(
            parse_definition("DispatchClass", &def).unwrap(),
            Node::ValueEnum {
                values: vec!["Normal".to_string(), "Operational".to_string()]
            }
        );
    }

    #[test]
    fn test_set_definition() {
        let def = Value::from_json_str(
            r#"{"type": "set", "value_type": "u64", "value_list": {"Display": 1, "Legal": 2}}"#,
        )
        .unwrap();
        match parse_definition("IdentityFields", &def).unwrap() {
            Node::Set { value_type, flags } => {
                assert_eq!(value_type, Primitive::U64);
                assert_eq!(flags[1], SetFlag { name: "Legal".to_string(), bits: 2 });
            }
            other => panic!("Expected Set, got {:?}", other),
        }

        let signed = Value::from_json_str(r#"{"type": "set", "value_type": "i8", "value_list": {}}"#)
            .unwrap();
        assert!(parse_definition("Bad", &signed).is_err());
    }

    #[test]
    fn test_invalid_definitions() {
        let missing_kind = Value::from_json_str(r#"{"type_mapping": []}"#).unwrap();
        assert!(matches!(
            parse_definition("X", &missing_kind),
            Err(CatalogError::InvalidDefinition { .. })
        ));

        let bad_pair = Value::from_json_str(r#"{"type": "struct", "type_mapping": [["only"]]}"#).unwrap();
        assert!(parse_definition("X", &bad_pair).is_err());

        assert!(parse_definition("X", &Value::Bool(true)).is_err());
        assert!(parse_type_map(&Value::from("u8")).is_err());
    }
}
