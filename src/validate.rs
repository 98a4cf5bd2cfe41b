//! Semantic validation
//!
//! Rules that structural schema checking cannot express. Each rule
//! collects every violation it finds before failing, so one rerun
//! fixes one whole class of authoring mistakes. All rules are
//! read-only over the tree and can run in any order relative to
//! structural validation.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::tree::{models, ConfigTree};

/// Semantic rule violations over the merged tree.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Model names are not unique: {}", .0.join(", "))]
    DuplicateModelNames(Vec<String>),
}

/// Check the cross-entity semantic rules on a merged tree.
///
/// New rules slot in as further checks here; each should gather all
/// its violations before returning.
pub fn validate_config(tree: &ConfigTree) -> Result<(), ValidationError> {
    check_unique_model_names(tree)
}

fn check_unique_model_names(tree: &ConfigTree) -> Result<(), ValidationError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for model in models(tree) {
        if let Some(name) = model.get("name").and_then(Value::as_str) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DuplicateModelNames(duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_names_pass() {
        let tree = json!({
            "models": [{ "name": "basking" }, { "name": "astronaut" }]
        });
        validate_config(&tree).unwrap();
    }

    #[test]
    fn test_duplicate_names_fail_naming_the_model() {
        let tree = json!({
            "models": [{ "name": "astronaut" }, { "name": "astronaut" }]
        });
        let err = validate_config(&tree).unwrap_err();
        assert!(err.to_string().contains("Model names are not unique"));
        assert!(err.to_string().contains("astronaut"));
    }

    #[test]
    fn test_all_duplicates_reported() {
        let tree = json!({
            "models": [
                { "name": "astronaut" },
                { "name": "astronaut" },
                { "name": "basking" },
                { "name": "basking" },
                { "name": "lava" }
            ]
        });
        match validate_config(&tree).unwrap_err() {
            ValidationError::DuplicateModelNames(names) => {
                assert_eq!(names, vec!["astronaut", "basking"]);
            }
        }
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let tree = json!({ "models": [{ "name": "a" }, { "name": "a" }] });
        let before = tree.clone();
        let _ = validate_config(&tree);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_empty_tree_passes() {
        validate_config(&json!({})).unwrap();
    }
}
