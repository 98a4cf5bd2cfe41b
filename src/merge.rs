//! Layered configuration merge
//!
//! Combines a program-level tree with one or more project-level trees:
//! - Objects: deep-merge by key (later layer wins per key path)
//! - Arrays: CONCAT, preserving relative order across layers
//! - Scalars: override (later layer wins)
//!
//! The merge is mechanical on purpose: it never deduplicates entity
//! lists. Uniqueness and cardinality are enforced afterwards by the
//! build transformer and the semantic validator, which can report the
//! offending entities instead of silently collapsing them.

use serde_json::Value;

/// Deep merge two trees, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays: concatenate, earlier layers first
        (Value::Array(mut base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
            Value::Array(base_items)
        }

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge config layers in order; the program tree is conventionally
/// first, so project trees override it.
///
/// Associative: `merge_configs([a, b, c])` equals
/// `merge_configs([merge_configs([a, b]), c])`, which keeps repeated
/// and partial merges composable.
pub fn merge_configs(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
