//! Compilation pipeline
//!
//! Strict single-threaded data-dependency pipeline: load sources,
//! early-fail schema validation per document, merge, derive, validate
//! (structural + semantic), then emit the runtime tree and optionally
//! the build records. All file I/O stays at the boundary (here and in
//! the CLI); the transform and validation passes are pure. A run
//! either produces every artifact or fails with nothing emitted.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use unibuild_schema::{Schema, SchemaError};

use crate::emit::{to_canonical_json, EmitError};
use crate::filter::filter_build_elements;
use crate::loader::{load_config, ConfigOrigin, ConfigSource, ParseError, SourceConfig};
use crate::merge::merge_configs;
use crate::transform::{transform_build_configs, transform_config, TransformError};
use crate::validate::{validate_config, ValidationError};

/// Umbrella error for a compilation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("emit error: {0}")]
    Emit(#[from] EmitError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Inputs and switches for one compilation run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Structural schema document (JSON). Optional: callers may compile
    /// without structural checks, e.g. while authoring a new schema.
    pub schema: Option<PathBuf>,

    /// Program-level config (YAML), merged first.
    pub program_config: PathBuf,

    /// Project-level configs (YAML), merged over the program in order.
    pub project_configs: Vec<PathBuf>,

    /// Strip build-only elements from the runtime output.
    pub filter_build_elements: bool,

    /// Also produce the build-record artifact (requires the merged
    /// tree to describe exactly one software unit).
    pub emit_build_config: bool,
}

/// The artifacts of a successful run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Canonical runtime configuration JSON.
    pub runtime_json: Vec<u8>,

    /// Canonical build configuration JSON (array of build records),
    /// when requested.
    pub build_json: Option<Vec<u8>>,

    /// Provenance of the contributing sources, in merge order.
    pub sources: Vec<ConfigSource>,
}

/// Run the full pipeline against files on disk.
pub fn compile(options: &CompileOptions) -> Result<CompileOutput, PipelineError> {
    let schema = match &options.schema {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Some(text.parse::<Schema>()?)
        }
        None => None,
    };

    let mut documents = Vec::new();
    documents.push(load_config(&options.program_config, ConfigOrigin::Program)?);
    for path in &options.project_configs {
        documents.push(load_config(path, ConfigOrigin::Project)?);
    }

    compile_documents(
        schema.as_ref(),
        documents,
        options.filter_build_elements,
        options.emit_build_config,
    )
}

/// Run the pipeline over already-loaded documents.
pub fn compile_documents(
    schema: Option<&Schema>,
    documents: Vec<SourceConfig>,
    filter: bool,
    emit_build: bool,
) -> Result<CompileOutput, PipelineError> {
    // Early-fail: each document must be structurally sound on its own.
    // Validation sees the derived form, since derived fields are part
    // of the schema's required surface.
    if let Some(schema) = schema {
        for document in &documents {
            schema.validate(&transform_config(document.tree.clone()))?;
        }
    }

    let mut sources = Vec::with_capacity(documents.len());
    let mut layers = Vec::with_capacity(documents.len());
    for document in documents {
        sources.push(document.source);
        layers.push(document.tree);
    }

    let merged = transform_config(merge_configs(layers));
    validate_config(&merged)?;

    let build_json = if emit_build {
        let records = transform_build_configs(&merged)?;
        Some(to_canonical_json(&records)?)
    } else {
        None
    };

    let runtime = if filter {
        filter_build_elements(&merged)
    } else {
        merged
    };
    if let Some(schema) = schema {
        schema.validate(&runtime)?;
    }

    Ok(CompileOutput {
        runtime_json: to_canonical_json(&runtime)?,
        build_json,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_config;

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
";

    const PROJECT: &str = "
software-configs:
  - build-target: 'reef'
    firmware:
      build-flags:
        serial: 'enabled'
";

    fn documents() -> Vec<SourceConfig> {
        vec![
            parse_config(PROGRAM, ConfigOrigin::Program).unwrap(),
            parse_config(PROJECT, ConfigOrigin::Project).unwrap(),
        ]
    }

    #[test]
    fn test_compile_documents_produces_both_artifacts() {
        let output = compile_documents(None, documents(), true, true).unwrap();
        let runtime: serde_json::Value = serde_json::from_slice(&output.runtime_json).unwrap();
        let build: serde_json::Value =
            serde_json::from_slice(&output.build_json.unwrap()).unwrap();

        assert_eq!(
            runtime["models"][0]["audio"]["main"]["cras_config_dir"],
            "/etc/cras/basking"
        );
        assert!(runtime.get("build_targets").is_none());
        assert_eq!(build[0]["build_target"], "reef");
    }

    #[test]
    fn test_no_build_artifact_unless_requested() {
        let output = compile_documents(None, documents(), false, false).unwrap();
        assert!(output.build_json.is_none());
    }

    #[test]
    fn test_semantic_failure_aborts_run() {
        let duplicate = parse_config(
            "
models:
  - name: 'basking'
  - name: 'basking'
",
            ConfigOrigin::Program,
        )
        .unwrap();
        let err = compile_documents(None, vec![duplicate], false, false).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
