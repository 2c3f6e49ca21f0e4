//! Error types for data stream loading and validation

use crate::decode::DecodeError;
use pkgstream_core_interface::FileSystemError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for data stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or validating a data stream
#[derive(Error, Debug)]
pub enum Error {
    /// `manifest.yml` is missing from the data stream directory
    #[error("Manifest does not exist for data stream: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The manifest could not be decoded into a data stream
    #[error("Error building data stream (path: {path}) in package {package}: {source}")]
    ManifestDecode {
        path: String,
        package: String,
        #[source]
        source: DecodeError,
    },

    /// Release is not one of the known channels
    #[error("Invalid release: {0}")]
    InvalidRelease(String),

    /// Pipeline files exist but the data stream references none of them
    #[error("Unused pipelines in the package (dataset: {dataset}): {}", join_paths(paths))]
    OrphanedPipelineFiles { dataset: String, paths: Vec<PathBuf> },

    /// Dataset contains a `-`
    #[error("Data stream name is not allowed to contain `-`: {0}")]
    InvalidDatasetName(String),

    /// Type is not logs, metrics, synthetics or traces
    #[error("Type is not valid: {0}")]
    InvalidType(String),

    /// Neither `<name>.json` nor `<name>.yml` exists
    #[error("Defined ingest_pipeline does not exist: {}", path.display())]
    PipelineNotFound { path: PathBuf },

    /// A pipeline file is not parseable
    #[error("Validating ingest pipeline file failed (path: {}): {message}", path.display())]
    PipelineSyntax { path: PathBuf, message: String },

    /// Pipeline file is neither `.json` nor `.yml`
    #[error("Unsupported pipeline extension (path: {}, ext: {ext})", path.display())]
    UnsupportedPipelineExtension { path: PathBuf, ext: String },

    /// A field definition file is not a list of fields
    #[error("Unmarshaling fields file failed (path: {}): {source}", path.display())]
    FieldsFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Field is not defined in any fields file
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// Field exists but declares no type
    #[error("Field '{0}' found, but type is undefined")]
    FieldTypeUndefined(String),

    /// Field exists with a different type
    #[error("Wrong field type for '{name}' (expected: {expected}, got: {got})")]
    FieldTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// First failure among the required field checks
    #[error("Validating required fields failed: {0}")]
    RequiredFields(#[source] Box<Error>),

    /// Filesystem failure, with the operation and path that triggered it
    #[error("{context} (path: {}): {source}", path.display())]
    FileSystem {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: FileSystemError,
    },
}

impl Error {
    /// Create a filesystem error for `path`
    pub fn file_system<P: Into<PathBuf>>(context: &'static str, path: P, source: FileSystemError) -> Self {
        Error::FileSystem {
            context,
            path: path.into(),
            source,
        }
    }

    /// Create a manifest not found error
    pub fn manifest_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Error::ManifestNotFound { path: path.into() }
    }

    /// Create a pipeline syntax error
    pub fn pipeline_syntax<P: Into<PathBuf>, S: fmt::Display>(path: P, message: S) -> Self {
        Error::PipelineSyntax {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a field type mismatch error
    pub fn field_type_mismatch<S: Into<String>>(name: S, expected: S, got: S) -> Self {
        Error::FieldTypeMismatch {
            name: name.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Get error category for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ManifestNotFound { .. }
            | Error::ManifestDecode { .. }
            | Error::InvalidRelease(_)
            | Error::OrphanedPipelineFiles { .. } => ErrorCategory::Load,
            Error::FileSystem { .. } => ErrorCategory::Filesystem,
            Error::InvalidDatasetName(_)
            | Error::InvalidType(_)
            | Error::PipelineNotFound { .. }
            | Error::PipelineSyntax { .. }
            | Error::UnsupportedPipelineExtension { .. }
            | Error::FieldsFile { .. }
            | Error::FieldNotFound(_)
            | Error::FieldTypeUndefined(_)
            | Error::FieldTypeMismatch { .. }
            | Error::RequiredFields(_) => ErrorCategory::Validation,
        }
    }

    /// True for failures raised by an explicit validation pass
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Manifest missing, undecodable, or inconsistent at load time
    Load,
    /// Failed a validation check
    Validation,
    /// Underlying filesystem failure
    Filesystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Load => write!(f, "load"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Filesystem => write!(f, "filesystem"),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
