//! Structural schema validation for unibuild runtime configuration.
//!
//! Implements the subset of JSON-Schema keywords the config domain
//! actually uses: `type`, `properties`, `required`, `items`, `enum`
//! and `additionalProperties`. Validation reports the violated field
//! path together with the constraint, and never mutates the value
//! under test.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while parsing a schema document or validating a value.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema at {path}: {reason}")]
    InvalidSchema { path: String, reason: String },

    #[error("required property missing: {property} at {path}")]
    MissingRequired { property: String, path: String },

    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: String,
    },

    #[error("disallowed value at {path}: {value}; allowed: {allowed}")]
    NotInEnum {
        path: String,
        value: String,
        allowed: String,
    },

    #[error("unknown property '{property}' at {path}")]
    UnknownProperty { property: String, path: String },
}

/// A parsed, validated schema ready to check values against.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Object {
        properties: Vec<(String, Node)>,
        required: Vec<String>,
        /// When false, properties not listed in `properties` are rejected.
        additional: bool,
    },
    Array {
        items: Option<Box<Node>>,
    },
    Scalar {
        ty: ScalarType,
        allowed: Option<Vec<Value>>,
    },
    /// No `type` keyword: any shape accepted (still subject to `enum`).
    Any { allowed: Option<Vec<Value>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ScalarType {
    fn name(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            ScalarType::String => value.is_string(),
            ScalarType::Integer => value.is_i64() || value.is_u64(),
            ScalarType::Number => value.is_number(),
            ScalarType::Boolean => value.is_boolean(),
        }
    }
}

impl Schema {
    /// Parse a schema from its JSON document.
    pub fn parse(doc: &Value) -> Result<Self, SchemaError> {
        let root = parse_node(doc, "$")?;
        Ok(Schema { root })
    }

    /// Validate a value against this schema.
    ///
    /// Read-only over the value; fails on the first structural violation
    /// with the offending path and constraint.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        validate_node(&self.root, value, "$")
    }
}

impl std::str::FromStr for Schema {
    type Err = SchemaError;

    /// Parse a schema from JSON text.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let doc: Value = serde_json::from_str(text).map_err(|e| SchemaError::InvalidSchema {
            path: "$".to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&doc)
    }
}

fn type_name(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

fn parse_node(doc: &Value, path: &str) -> Result<Node, SchemaError> {
    let map = doc.as_object().ok_or_else(|| SchemaError::InvalidSchema {
        path: path.to_string(),
        reason: "schema node must be an object".to_string(),
    })?;

    let allowed = match map.get("enum") {
        Some(Value::Array(values)) => Some(values.clone()),
        Some(other) => {
            return Err(SchemaError::InvalidSchema {
                path: path.to_string(),
                reason: format!("'enum' must be an array, got {}", type_name(other)),
            })
        }
        None => None,
    };

    let ty = match map.get("type") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(SchemaError::InvalidSchema {
                path: path.to_string(),
                reason: format!("'type' must be a string, got {}", type_name(other)),
            })
        }
        None => return Ok(Node::Any { allowed }),
    };

    match ty {
        "object" => {
            let mut properties = Vec::new();
            if let Some(props) = map.get("properties") {
                let props = props.as_object().ok_or_else(|| SchemaError::InvalidSchema {
                    path: path.to_string(),
                    reason: "'properties' must be an object".to_string(),
                })?;
                for (name, sub) in props {
                    let sub_path = format!("{}.{}", path, name);
                    properties.push((name.clone(), parse_node(sub, &sub_path)?));
                }
            }

            let mut required = Vec::new();
            if let Some(req) = map.get("required") {
                let req = req.as_array().ok_or_else(|| SchemaError::InvalidSchema {
                    path: path.to_string(),
                    reason: "'required' must be an array".to_string(),
                })?;
                for entry in req {
                    match entry.as_str() {
                        Some(name) => required.push(name.to_string()),
                        None => {
                            return Err(SchemaError::InvalidSchema {
                                path: path.to_string(),
                                reason: "'required' entries must be strings".to_string(),
                            })
                        }
                    }
                }
            }

            let additional = match map.get("additionalProperties") {
                Some(Value::Bool(b)) => *b,
                None => true,
                Some(other) => {
                    return Err(SchemaError::InvalidSchema {
                        path: path.to_string(),
                        reason: format!(
                            "'additionalProperties' must be a boolean, got {}",
                            type_name(other)
                        ),
                    })
                }
            };

            Ok(Node::Object {
                properties,
                required,
                additional,
            })
        }
        "array" => {
            let items = match map.get("items") {
                Some(sub) => Some(Box::new(parse_node(sub, &format!("{}[]", path))?)),
                None => None,
            };
            Ok(Node::Array { items })
        }
        "string" => Ok(Node::Scalar {
            ty: ScalarType::String,
            allowed,
        }),
        "integer" => Ok(Node::Scalar {
            ty: ScalarType::Integer,
            allowed,
        }),
        "number" => Ok(Node::Scalar {
            ty: ScalarType::Number,
            allowed,
        }),
        "boolean" => Ok(Node::Scalar {
            ty: ScalarType::Boolean,
            allowed,
        }),
        other => Err(SchemaError::InvalidSchema {
            path: path.to_string(),
            reason: format!("unsupported type '{}'", other),
        }),
    }
}

fn check_enum(allowed: &Option<Vec<Value>>, value: &Value, path: &str) -> Result<(), SchemaError> {
    if let Some(allowed) = allowed {
        if !allowed.contains(value) {
            let rendered: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            return Err(SchemaError::NotInEnum {
                path: path.to_string(),
                value: value.to_string(),
                allowed: rendered.join(", "),
            });
        }
    }
    Ok(())
}

fn validate_node(node: &Node, value: &Value, path: &str) -> Result<(), SchemaError> {
    match node {
        Node::Object {
            properties,
            required,
            additional,
        } => {
            let map = value.as_object().ok_or_else(|| SchemaError::TypeMismatch {
                path: path.to_string(),
                expected: "object",
                actual: type_name(value),
            })?;

            for name in required {
                if !map.contains_key(name) {
                    return Err(SchemaError::MissingRequired {
                        property: name.clone(),
                        path: path.to_string(),
                    });
                }
            }

            for (name, sub) in properties {
                if let Some(child) = map.get(name) {
                    validate_node(sub, child, &format!("{}.{}", path, name))?;
                }
            }

            if !*additional {
                for name in map.keys() {
                    if !properties.iter().any(|(p, _)| p == name) {
                        return Err(SchemaError::UnknownProperty {
                            property: name.clone(),
                            path: path.to_string(),
                        });
                    }
                }
            }

            Ok(())
        }
        Node::Array { items } => {
            let entries = value.as_array().ok_or_else(|| SchemaError::TypeMismatch {
                path: path.to_string(),
                expected: "array",
                actual: type_name(value),
            })?;
            if let Some(items) = items {
                for (i, entry) in entries.iter().enumerate() {
                    validate_node(items, entry, &format!("{}[{}]", path, i))?;
                }
            }
            Ok(())
        }
        Node::Scalar { ty, allowed } => {
            if !ty.matches(value) {
                return Err(SchemaError::TypeMismatch {
                    path: path.to_string(),
                    expected: ty.name(),
                    actual: type_name(value),
                });
            }
            check_enum(allowed, value, path)
        }
        Node::Any { allowed } => check_enum(allowed, value, path),
    }
}
