//! Build transformation
//!
//! Two passes over the merged tree:
//!
//! - `transform_config` derives per-model runtime fields (audio config
//!   paths) from their authored shorthand.
//! - `transform_build_configs` flattens the tree into build records,
//!   one per software unit, enforcing the lookup and cardinality
//!   invariants the build system depends on. The build system invokes
//!   the compiler once per firmware build, so anything other than
//!   exactly one build target and exactly one software config for it
//!   is an authoring error, caught here instead of producing an
//!   ambiguous image downstream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tree::ConfigTree;

/// Base directory for CRAS audio configuration on the device.
const CRAS_CONFIG_BASE: &str = "/etc/cras";

/// Transform failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformErrorKind {
    /// An entity references a name absent from the merged tree.
    Lookup,
    /// Zero or multiple entities where exactly one is required.
    Cardinality,
    /// A section does not deserialize into its expected shape.
    Shape,
}

/// Errors raised while flattening the merged tree into build records.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to lookup Program {0}")]
    ProgramLookup(String),

    #[error("Single build_target required")]
    SingleBuildTarget,

    #[error("Software config is required")]
    MissingSoftwareConfig,

    #[error("Multiple software configs for build_target '{0}'")]
    DuplicateSoftwareConfig(String),

    #[error("malformed {section} section: {source}")]
    Shape {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl TransformError {
    /// Classify this error for exit-code and reporting purposes.
    pub fn kind(&self) -> TransformErrorKind {
        match self {
            TransformError::ProgramLookup(_) => TransformErrorKind::Lookup,
            TransformError::SingleBuildTarget
            | TransformError::MissingSoftwareConfig
            | TransformError::DuplicateSoftwareConfig(_) => TransformErrorKind::Cardinality,
            TransformError::Shape { .. } => TransformErrorKind::Shape,
        }
    }
}

/// A top-level named entity owning projects and build targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
}

/// The compiled firmware/OS image target for one or more models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTarget {
    pub name: String,
    /// Name of the owning program.
    pub program: String,
}

/// Per-design build-time settings keyed to a build target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftwareConfig {
    pub build_target: String,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// Optional branding metadata. A model may ship brand-less, e.g. in
/// development builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBrand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oem_name: Option<String>,
}

/// The resolved, validated unit of build configuration for one
/// model/build-target pairing.
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecord {
    pub program: String,
    pub build_target: String,
    pub device_brands: Vec<DeviceBrand>,
    pub software_config: SoftwareConfig,
}

fn section<T: serde::de::DeserializeOwned>(
    tree: &ConfigTree,
    key: &'static str,
) -> Result<Vec<T>, TransformError> {
    match tree.get(key) {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|source| TransformError::Shape { section: key, source }),
    }
}

/// Derive per-model runtime fields on a merged tree.
///
/// Today this resolves the authored `cras_config_subdir` shorthand into
/// the on-device `cras_config_dir` path. Takes the tree by value: the
/// merged input stays untouched for independent validation.
pub fn transform_config(mut tree: ConfigTree) -> ConfigTree {
    if let Some(models) = tree.get_mut("models").and_then(Value::as_array_mut) {
        for model in models {
            let Some(main) = model
                .pointer_mut("/audio/main")
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            if let Some(subdir) = main.get("cras_config_subdir").and_then(Value::as_str) {
                let dir = format!("{}/{}", CRAS_CONFIG_BASE, subdir);
                main.insert("cras_config_dir".to_string(), Value::String(dir));
            }
        }
    }
    tree
}

/// Flatten one software unit's merged tree into build records.
///
/// Checks run in order and every failure is fatal; no partial output:
/// 1. every build target's program must resolve by name,
/// 2. exactly one build target overall,
/// 3. an empty device-brand list is legal,
/// 4. exactly one software config must resolve to the build target
///    (identity by target name, not by content).
pub fn transform_build_configs(tree: &ConfigTree) -> Result<Vec<BuildRecord>, TransformError> {
    let programs: Vec<Program> = section(tree, "programs")?;
    let build_targets: Vec<BuildTarget> = section(tree, "build_targets")?;
    let device_brands: Vec<DeviceBrand> = section(tree, "device_brands")?;
    let software_configs: Vec<SoftwareConfig> = section(tree, "software_configs")?;

    for target in &build_targets {
        if !programs.iter().any(|p| p.name == target.program) {
            return Err(TransformError::ProgramLookup(target.program.clone()));
        }
    }

    let target = match build_targets.as_slice() {
        [single] => single,
        _ => return Err(TransformError::SingleBuildTarget),
    };

    let mut matching = software_configs
        .into_iter()
        .filter(|sc| sc.build_target == target.name);
    let software_config = match (matching.next(), matching.next()) {
        (Some(single), None) => single,
        (None, _) => return Err(TransformError::MissingSoftwareConfig),
        (Some(_), Some(_)) => {
            return Err(TransformError::DuplicateSoftwareConfig(target.name.clone()))
        }
    };

    Ok(vec![BuildRecord {
        program: target.program.clone(),
        build_target: target.name.clone(),
        device_brands,
        software_config,
    }])
}
