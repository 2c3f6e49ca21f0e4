/*!
 * Error types for pkgstream
 */

use pkgstream_core_manifest::Error as ManifestError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PkgstreamError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum PkgstreamError {
    /// Package root does not exist or is not a directory
    PackageNotFound(PathBuf),

    /// Package-level manifest could not be read or decoded
    PackageManifest { path: PathBuf, message: String },

    /// Named data stream is not part of the package
    DataStreamNotFound { package: String, name: String },

    /// Loading or validating a data stream failed
    Manifest(ManifestError),

    /// One or more data streams failed; the count is reported
    ChecksFailed { failed: usize, total: usize },

    /// I/O error
    Io(io::Error),

    /// Configuration error
    Config(String),
}

impl PkgstreamError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PkgstreamError::ChecksFailed { .. } => EXIT_INVALID,
            PkgstreamError::Manifest(e) if e.is_validation() => EXIT_INVALID,
            _ => EXIT_FATAL,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PkgstreamError::PackageNotFound(_)
            | PkgstreamError::PackageManifest { .. }
            | PkgstreamError::DataStreamNotFound { .. } => ErrorCategory::Package,
            PkgstreamError::Manifest(e) if e.is_validation() => ErrorCategory::Validation,
            PkgstreamError::Manifest(_) => ErrorCategory::Load,
            PkgstreamError::ChecksFailed { .. } => ErrorCategory::Validation,
            PkgstreamError::Io(_) => ErrorCategory::IoError,
            PkgstreamError::Config(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Package root or package manifest problems
    Package,
    /// Data stream manifest could not be loaded
    Load,
    /// Data stream loaded but is not valid
    Validation,
    /// I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Package => write!(f, "package"),
            ErrorCategory::Load => write!(f, "load"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
        }
    }
}

impl fmt::Display for PkgstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkgstreamError::PackageNotFound(path) => {
                write!(f, "Package not found: {}", path.display())
            }
            PkgstreamError::PackageManifest { path, message } => {
                write!(f, "Reading package manifest failed (path: {}): {}", path.display(), message)
            }
            PkgstreamError::DataStreamNotFound { package, name } => {
                write!(f, "Data stream {} not found in package {}", name, package)
            }
            PkgstreamError::Manifest(err) => {
                write!(f, "{}", err)
            }
            PkgstreamError::ChecksFailed { failed, total } => {
                write!(f, "{} of {} data streams failed", failed, total)
            }
            PkgstreamError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            PkgstreamError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PkgstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PkgstreamError::Manifest(err) => Some(err),
            PkgstreamError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PkgstreamError {
    fn from(err: io::Error) -> Self {
        PkgstreamError::Io(err)
    }
}

impl From<ManifestError> for PkgstreamError {
    fn from(err: ManifestError) -> Self {
        PkgstreamError::Manifest(err)
    }
}
