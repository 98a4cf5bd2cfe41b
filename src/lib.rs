//! Unibuild config compiler
//!
//! Compiles layered, inheritance-based device/board configuration
//! sources into a resolved build configuration (per-unit build
//! records) and a runtime configuration stripped of build-only fields.

pub mod emit;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod transform;
pub mod tree;
pub mod validate;

pub use emit::{to_canonical_json, to_canonical_string, EmitError};
pub use filter::filter_build_elements;
pub use loader::{load_config, parse_config, ConfigOrigin, ConfigSource, ParseError, SourceConfig};
pub use merge::{deep_merge, merge_configs};
pub use pipeline::{compile, compile_documents, CompileOptions, CompileOutput, PipelineError};
pub use transform::{
    transform_build_configs, transform_config, BuildRecord, BuildTarget, DeviceBrand, Program,
    SoftwareConfig, TransformError, TransformErrorKind,
};
pub use tree::ConfigTree;
pub use validate::{validate_config, ValidationError};
