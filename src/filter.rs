//! Runtime filtering
//!
//! Projects the build tree into the deployment-facing runtime tree by
//! removing everything tagged build-only: per-model firmware blocks
//! and the top-level sections only the build system consumes. Pure
//! projection: the input is untouched and re-filtering the output is
//! a no-op.

use serde_json::Value;

use crate::tree::ConfigTree;

/// Per-model keys only needed to produce a firmware/OS image.
const BUILD_ONLY_MODEL_KEYS: &[&str] = &["firmware"];

/// Top-level sections only the build system consumes.
const BUILD_ONLY_SECTIONS: &[&str] = &[
    "programs",
    "build_targets",
    "software_configs",
    "device_brands",
];

/// Produce the runtime tree with all build-only fields removed.
pub fn filter_build_elements(tree: &ConfigTree) -> ConfigTree {
    let mut out = tree.clone();

    if let Some(root) = out.as_object_mut() {
        for key in BUILD_ONLY_SECTIONS {
            root.remove(*key);
        }
    }

    if let Some(models) = out.get_mut("models").and_then(Value::as_array_mut) {
        for model in models {
            if let Some(model) = model.as_object_mut() {
                for key in BUILD_ONLY_MODEL_KEYS {
                    model.remove(*key);
                }
            }
        }
    }

    out
}
