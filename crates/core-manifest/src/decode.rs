//! Structured config decoding
//!
//! Manifests are decoded with serde into their typed shape: unknown keys are
//! ignored, nested objects decode into nested types, and a missing or
//! mistyped field fails the whole decode with the field named. Right after a
//! successful decode the target's [`PostDecode`] hook runs; an error from the
//! hook fails the decode as well.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while decoding a manifest
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Malformed YAML, a missing field, or a type mismatch
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Input contains no document at all
    #[error("Manifest is empty")]
    Empty,

    /// A required field is present but empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl DecodeError {
    /// Create a missing field error
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        DecodeError::MissingField {
            field: field.into(),
        }
    }
}

/// Self-check run immediately after a value has been decoded
pub trait PostDecode {
    fn post_decode(&self) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Fail with [`DecodeError::MissingField`] when `value` is empty
pub fn require_non_empty(field: &str, value: &str) -> Result<(), DecodeError> {
    if value.trim().is_empty() {
        return Err(DecodeError::missing_field(field));
    }
    Ok(())
}

/// Decode a YAML buffer into `T` and run its post-decode hook
pub fn decode_yaml<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned + PostDecode,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }
    let value: T = serde_yaml::from_slice(bytes)?;
    value.post_decode()?;
    Ok(value)
}
