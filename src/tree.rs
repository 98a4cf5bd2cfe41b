//! ConfigTree value layer
//!
//! A ConfigTree is an ordered mapping from string keys to scalars,
//! sequences and nested mappings, represented as `serde_json::Value`.
//! Source documents use hyphenated keys; everything past the loader
//! works on the underscore-normalized form, so downstream code never
//! deals with identifiers that are invalid in Rust or in the generated
//! access structs.

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// The in-memory configuration tree.
pub type ConfigTree = Value;

/// Two distinct source keys normalized to the same identifier.
#[derive(Debug, Error)]
#[error("key collision after normalization: '{first}' and '{second}' both map to '{normalized}'")]
pub struct KeyCollision {
    pub first: String,
    pub second: String,
    pub normalized: String,
}

/// Normalize a single source key: hyphens become underscores.
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Rewrite every mapping key in the tree to its normalized form.
///
/// Normalization must be total and collision-free: if two distinct keys
/// at the same level normalize to the same identifier, the document is
/// rejected rather than silently dropping one of them.
pub fn normalize_keys(value: Value) -> Result<Value, KeyCollision> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            let mut originals: HashMap<String, String> = HashMap::new();
            for (key, child) in map {
                let normalized = normalize_key(&key);
                if let Some(first) = originals.get(&normalized) {
                    return Err(KeyCollision {
                        first: first.clone(),
                        second: key,
                        normalized,
                    });
                }
                originals.insert(normalized.clone(), key);
                out.insert(normalized, normalize_keys(child)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize_keys(item)?);
            }
            Ok(Value::Array(out))
        }
        scalar => Ok(scalar),
    }
}

/// Look up a dotted key path (e.g. `"audio.main.cras_config_dir"`).
pub fn get_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// The models section of a tree, or an empty slice when absent.
pub fn models(tree: &Value) -> &[Value] {
    tree.get("models")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
