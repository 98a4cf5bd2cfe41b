//! Source document loading
//!
//! Parses layered YAML configuration documents into ConfigTrees with
//! all intra-document references resolved. Resolution is an explicit
//! two-phase pass rather than deserializer-native aliasing:
//!
//! 1. Top-level mapping entries that are not reserved sections are
//!    collected as named template fragments and removed from the tree.
//! 2. Every mapping carrying the `<<` inherit key is spliced: the
//!    referenced fragments are merged in listed order, then the site's
//!    own keys are applied on top, last-write-wins per key.
//!
//! After resolution every key is normalized (hyphen to underscore), so
//! fragments and the `<<` marker never appear in loader output.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::tree::{normalize_keys, ConfigTree, KeyCollision};

/// Top-level sections recognized by the compiler. Everything else at
/// the top level of a source document is a template fragment.
pub const RESERVED_SECTIONS: &[&str] = &[
    "programs",
    "build-targets",
    "models",
    "software-configs",
    "device-brands",
];

/// The inherit marker on a mapping.
const INHERIT_KEY: &str = "<<";

/// Errors raised while reading, parsing or resolving a source document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid UTF-8 in {path}: {source}")]
    Utf8 {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("non-string mapping key in {origin}")]
    NonStringKey { origin: String },

    #[error("unrepresentable number in {origin}")]
    BadNumber { origin: String },

    #[error("document root in {origin} must be a mapping")]
    RootNotMapping { origin: String },

    #[error("reference to unknown template '{name}' in {origin}")]
    UnknownTemplate { name: String, origin: String },

    #[error("inherit reference in {origin} must name a template or be a mapping")]
    BadReference { origin: String },

    #[error("in {origin}: {source}")]
    Collision {
        origin: String,
        #[source]
        source: KeyCollision,
    },
}

/// Scope a source document was authored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Program,
    Project,
}

/// Provenance of a loaded source document.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for in-memory documents)
    pub path: Option<String>,

    /// SHA-256 digest of the raw document bytes
    pub digest: Option<String>,
}

impl ConfigSource {
    /// Label used in error messages for this source.
    pub fn label(&self) -> &str {
        self.path.as_deref().unwrap_or("<inline>")
    }
}

/// A fully resolved source document plus its provenance.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub tree: ConfigTree,
    pub source: ConfigSource,
}

/// Load and resolve one source document from disk.
pub fn load_config(path: &Path, origin: ConfigOrigin) -> Result<SourceConfig, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let text = std::str::from_utf8(&bytes).map_err(|source| ParseError::Utf8 {
        path: path.display().to_string(),
        source,
    })?;
    let source = ConfigSource {
        origin,
        path: Some(path.display().to_string()),
        digest: Some(digest),
    };
    let tree = parse_document(text, source.label())?;
    Ok(SourceConfig { tree, source })
}

/// Resolve one source document from text (used by tests and callers
/// that stage documents themselves).
pub fn parse_config(text: &str, origin: ConfigOrigin) -> Result<SourceConfig, ParseError> {
    let source = ConfigSource {
        origin,
        path: None,
        digest: None,
    };
    let tree = parse_document(text, source.label())?;
    Ok(SourceConfig { tree, source })
}

fn parse_document(text: &str, label: &str) -> Result<ConfigTree, ParseError> {
    let raw: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| ParseError::Yaml {
            origin: label.to_string(),
            source,
        })?;
    let value = yaml_to_json(raw, label)?;

    let root = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(ParseError::RootNotMapping {
                origin: label.to_string(),
            })
        }
    };

    // Phase 1: partition reserved sections from template fragments.
    let mut sections = Map::new();
    let mut fragments = Map::new();
    for (key, child) in root {
        if RESERVED_SECTIONS.contains(&key.as_str()) {
            sections.insert(key, child);
        } else {
            fragments.insert(key, child);
        }
    }

    // Fragments may inherit from fragments defined before them.
    let mut resolved_fragments = Map::new();
    for (name, fragment) in fragments {
        let mut fragment = fragment;
        resolve_inherits(&mut fragment, &resolved_fragments, label)?;
        resolved_fragments.insert(name, fragment);
    }

    // Phase 2: splice every inherit site in the sections.
    let mut tree = Value::Object(sections);
    resolve_inherits(&mut tree, &resolved_fragments, label)?;

    normalize_keys(tree).map_err(|source| ParseError::Collision {
        origin: label.to_string(),
        source,
    })
}

fn yaml_to_json(value: serde_yaml::Value, label: &str) -> Result<Value, ParseError> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            let number = if let Some(u) = n.as_u64() {
                Number::from(u)
            } else if let Some(i) = n.as_i64() {
                Number::from(i)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| ParseError::BadNumber {
                        origin: label.to_string(),
                    })?
            };
            Ok(Value::Number(number))
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(yaml_to_json(item, label)?);
            }
            Ok(Value::Array(out))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    _ => {
                        return Err(ParseError::NonStringKey {
                            origin: label.to_string(),
                        })
                    }
                };
                out.insert(key, yaml_to_json(child, label)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value, label),
    }
}

/// Walk the tree and splice every `<<` site.
fn resolve_inherits(
    value: &mut Value,
    fragments: &Map<String, Value>,
    label: &str,
) -> Result<(), ParseError> {
    match value {
        Value::Object(map) => {
            resolve_map_inherits(map, fragments, label)?;
            for child in map.values_mut() {
                resolve_inherits(child, fragments, label)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                resolve_inherits(item, fragments, label)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Splice the `<<` entry of one mapping, per YAML merge-key semantics:
/// the site's own keys win over inherited ones, and for a list-valued
/// reference earlier entries win over later ones. A referenced fragment
/// may itself inherit; it is fully resolved before its keys are taken,
/// so the `<<` marker never survives into the spliced result.
fn resolve_map_inherits(
    map: &mut Map<String, Value>,
    fragments: &Map<String, Value>,
    label: &str,
) -> Result<(), ParseError> {
    while let Some(reference) = map.remove(INHERIT_KEY) {
        let mut base = Map::new();
        for entry in reference_entries(reference) {
            let fragment = match entry {
                Value::String(name) => fragments
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| ParseError::UnknownTemplate {
                        name,
                        origin: label.to_string(),
                    })?,
                fragment @ Value::Object(_) => fragment,
                _ => {
                    return Err(ParseError::BadReference {
                        origin: label.to_string(),
                    })
                }
            };
            let mut fragment = match fragment {
                Value::Object(m) => m,
                _ => {
                    return Err(ParseError::BadReference {
                        origin: label.to_string(),
                    })
                }
            };
            resolve_map_inherits(&mut fragment, fragments, label)?;
            for (key, child) in fragment {
                // earlier reference entries take precedence
                base.entry(key).or_insert(child);
            }
        }
        for (key, child) in std::mem::take(map) {
            base.insert(key, child);
        }
        *map = base;
    }
    Ok(())
}

fn reference_entries(reference: Value) -> Vec<Value> {
    match reference {
        Value::Array(items) => items,
        single => vec![single],
    }
}
