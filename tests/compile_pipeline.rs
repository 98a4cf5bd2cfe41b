//! End-to-end compilation tests
//!
//! Drives the full pipeline over the checked-in fixture documents and
//! compares artifacts byte-for-byte against expected output:
//! - runtime artifact matches the golden file (filter applied)
//! - build artifact matches the golden file
//! - compiling twice yields identical bytes (determinism)
//! - schema violations surface the offending field path

use std::fs;
use std::path::{Path, PathBuf};

use unibuild_config::{
    compile, compile_documents, parse_config, CompileOptions, ConfigOrigin, PipelineError,
};
use unibuild_schema::Schema;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_options() -> CompileOptions {
    CompileOptions {
        schema: Some(fixture("schema.json")),
        program_config: fixture("program.yaml"),
        project_configs: vec![fixture("project.yaml")],
        filter_build_elements: true,
        emit_build_config: true,
    }
}

#[test]
fn test_runtime_artifact_matches_golden() {
    let output = compile(&fixture_options()).unwrap();
    let expected = fs::read(fixture("expected_runtime.json")).unwrap();
    assert_eq!(
        output.runtime_json,
        expected,
        "runtime artifact drifted from tests/fixtures/expected_runtime.json"
    );
}

#[test]
fn test_build_artifact_matches_golden() {
    let output = compile(&fixture_options()).unwrap();
    let expected = fs::read(fixture("expected_build.json")).unwrap();
    assert_eq!(
        output.build_json.unwrap(),
        expected,
        "build artifact drifted from tests/fixtures/expected_build.json"
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(&fixture_options()).unwrap();
    let second = compile(&fixture_options()).unwrap();
    assert_eq!(first.runtime_json, second.runtime_json);
    assert_eq!(first.build_json, second.build_json);
}

#[test]
fn test_unfiltered_output_retains_firmware() {
    let mut options = fixture_options();
    options.filter_build_elements = false;

    let output = compile(&options).unwrap();
    let runtime: serde_json::Value = serde_json::from_slice(&output.runtime_json).unwrap();

    let model = &runtime["models"][0];
    assert_eq!(model["firmware"]["key_id"], "OEM2");
    assert_eq!(model["firmware"]["bcs_overlay"], "overlay-reef-private");
    // derived audio path is present either way
    assert_eq!(
        unibuild_config::tree::get_path(model, "audio.main.cras_config_dir")
            .and_then(serde_json::Value::as_str),
        Some("/etc/cras/basking")
    );
}

#[test]
fn test_filtered_output_omits_firmware() {
    let output = compile(&fixture_options()).unwrap();
    let runtime: serde_json::Value = serde_json::from_slice(&output.runtime_json).unwrap();
    assert!(runtime["models"][0].get("firmware").is_none());
}

#[test]
fn test_sources_recorded_in_merge_order() {
    let output = compile(&fixture_options()).unwrap();
    assert_eq!(output.sources.len(), 2);
    assert_eq!(output.sources[0].origin, ConfigOrigin::Program);
    assert_eq!(output.sources[1].origin, ConfigOrigin::Project);
    assert!(output.sources.iter().all(|s| s.digest.is_some()));
}

#[test]
fn test_missing_required_element_names_field() {
    // Drop the audio shorthand so the derived cras_config_dir never
    // appears; early validation must name it.
    let program = fs::read_to_string(fixture("program.yaml")).unwrap();
    let stripped = program.replace("cras-config-subdir: 'basking'\n", "");
    let schema_text = fs::read_to_string(fixture("schema.json")).unwrap();

    let schema: Schema = schema_text.parse().unwrap();
    let document = parse_config(&stripped, ConfigOrigin::Program).unwrap();

    let err = compile_documents(Some(&schema), vec![document], true, false).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("required"));
    assert!(message.contains("cras_config_dir"));
}

#[test]
fn test_failed_run_produces_no_artifacts() {
    let mut options = fixture_options();
    options.program_config = fixture("does_not_exist.yaml");

    match compile(&options) {
        Err(PipelineError::Parse(_)) => {}
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_outputs_written_only_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("runtime.json");

    let output = compile(&fixture_options()).unwrap();
    fs::write(&out_path, &output.runtime_json).unwrap();

    let written = fs::read(&out_path).unwrap();
    assert_eq!(written, fs::read(fixture("expected_runtime.json")).unwrap());
}
