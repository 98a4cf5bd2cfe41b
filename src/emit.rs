//! Canonical output emission
//!
//! All artifacts are serialized as RFC 8785 canonical JSON (JCS): key
//! order and whitespace are fixed, so an identical tree always yields
//! byte-identical output regardless of map-iteration order. Checked-in
//! expected outputs can then be compared byte-for-byte.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("canonical JSON serialization failed: {0}")]
    Canonical(String),
}

/// Serialize a value as canonical JSON bytes.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, EmitError> {
    serde_json_canonicalizer::to_vec(value).map_err(|e| EmitError::Canonical(e.to_string()))
}

/// Serialize a value as a canonical JSON string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, EmitError> {
    let bytes = to_canonical_json(value)?;
    String::from_utf8(bytes).map_err(|e| EmitError::Canonical(e.to_string()))
}
