//! Merge and filter property tests
//!
//! Exercises the compositional properties the pipeline relies on,
//! using real source documents rather than hand-built trees:
//! - merge associativity over three layered documents
//! - filter idempotence and purity on a compiled tree
//! - brand-less configurations still compile

use unibuild_config::{
    filter_build_elements, merge_configs, parse_config, transform_build_configs, ConfigOrigin,
};

const PROGRAM: &str = "
programs:
  - name: 'reef'
build-targets:
  - name: 'reef'
    program: 'reef'
models:
  - name: 'basking'
    audio:
      main:
        cras-config-subdir: 'basking'
    firmware:
      key-id: 'OEM2'
";

const PROJECT_A: &str = "
models:
  - name: 'astro'
    audio:
      main:
        cras-config-subdir: 'astro'
software-configs:
  - build-target: 'reef'
    firmware:
      build-flags:
        serial: 'enabled'
";

const PROJECT_B: &str = "
device-brands:
  - brand-code: 'ASUN'
    oem-name: 'Asun'
";

fn tree(text: &str, origin: ConfigOrigin) -> serde_json::Value {
    parse_config(text, origin).unwrap().tree
}

#[test]
fn test_merge_is_associative_over_documents() {
    let a = tree(PROGRAM, ConfigOrigin::Program);
    let b = tree(PROJECT_A, ConfigOrigin::Project);
    let c = tree(PROJECT_B, ConfigOrigin::Project);

    let all_at_once = merge_configs(vec![a.clone(), b.clone(), c.clone()]);
    let pairwise = merge_configs(vec![merge_configs(vec![a, b]), c]);

    assert_eq!(all_at_once, pairwise);
}

#[test]
fn test_refilter_is_idempotent_on_merged_tree() {
    let merged = merge_configs(vec![
        tree(PROGRAM, ConfigOrigin::Program),
        tree(PROJECT_A, ConfigOrigin::Project),
    ]);

    let once = filter_build_elements(&merged);
    let twice = filter_build_elements(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_filter_leaves_input_for_independent_use() {
    let merged = merge_configs(vec![
        tree(PROGRAM, ConfigOrigin::Program),
        tree(PROJECT_A, ConfigOrigin::Project),
    ]);
    let before = merged.clone();

    let _ = filter_build_elements(&merged);

    // the build tree is still intact for the build transformer
    assert_eq!(merged, before);
    assert!(transform_build_configs(&merged).is_ok());
}

#[test]
fn test_brandless_unit_still_produces_build_record() {
    // PROJECT_B (the only brand source) left out entirely.
    let merged = merge_configs(vec![
        tree(PROGRAM, ConfigOrigin::Program),
        tree(PROJECT_A, ConfigOrigin::Project),
    ]);

    let records = transform_build_configs(&merged).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].device_brands.is_empty());
}

#[test]
fn test_duplicate_names_across_documents_caught_after_merge() {
    // Program and project each define a model named 'basking'; the
    // merge keeps both and the validator reports the duplicate.
    let merged = merge_configs(vec![
        tree(PROGRAM, ConfigOrigin::Program),
        tree(
            "models:\n  - name: 'basking'\n",
            ConfigOrigin::Project,
        ),
    ]);

    let err = unibuild_config::validate_config(&merged).unwrap_err();
    assert!(err.to_string().contains("basking"));
}
