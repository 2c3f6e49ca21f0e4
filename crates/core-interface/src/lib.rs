//! pkgstream Core Interface: Package Filesystem Abstraction
//!
//! This crate defines the `PackageFileSystem` trait, the read-only view of a
//! package that the manifest loader and validator work against. A package may
//! live in a directory on disk or entirely in memory; the core never knows
//! which.
//!
//! # Architecture
//!
//! The abstraction has three parts:
//!
//! 1. **`PackageFileSystem`**: `stat`, `glob`, `read_all` and `close` on
//!    package-relative paths
//! 2. **`FileSystemProvider`**: something that can hand out a fresh handle
//!    (a package, a test fixture)
//! 3. **`ScopedFileSystem`**: a guard that closes the handle on every exit
//!    path
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgstream_core_interface::{FileSystemProvider, LocalFileSystem, PackageFileSystemExt};
//! use std::path::Path;
//!
//! fn has_manifest(provider: &dyn FileSystemProvider) -> pkgstream_core_interface::Result<bool> {
//!     let fs = provider.open_scoped()?;
//!     fs.exists(Path::new("manifest.yml"))
//! }
//!
//! let package = LocalFileSystem::new("/packages/nginx");
//! let _ = has_manifest(&package);
//! ```

use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("System error: {0}")]
    System(String),
}

impl FileSystemError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => FileSystemError::NotFound(path),
            io::ErrorKind::PermissionDenied => FileSystemError::PermissionDenied(path),
            _ => FileSystemError::Io { path, source: err },
        }
    }

    /// True when the error only says the path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileSystemError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

/// Metadata for a file or directory inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Package-relative path
    pub path: PathBuf,

    /// Size in bytes (0 for directories)
    pub len: u64,

    /// Whether this is a directory
    pub is_dir: bool,
}

impl FileMetadata {
    /// Create metadata for a file
    pub fn file(path: impl Into<PathBuf>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
            is_dir: false,
        }
    }

    /// Create metadata for a directory
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
        }
    }
}

/// Read-only view of a package
///
/// All paths are relative to the package root. Implementations must be
/// safe to read from several threads at once; the core itself never shares a
/// handle between operations.
pub trait PackageFileSystem: Send + Sync {
    /// Get metadata for a path
    ///
    /// # Errors
    ///
    /// Returns `FileSystemError::NotFound` if the path doesn't exist, so that
    /// callers can tell absence apart from a failing backend.
    fn stat(&self, path: &Path) -> Result<FileMetadata>;

    /// Expand a glob pattern
    ///
    /// `*` never crosses a path separator, so `dir/*` lists the immediate
    /// children of `dir`. Results are sorted. A pattern rooted in a missing
    /// directory matches nothing.
    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>>;

    /// Read an entire file into memory
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    /// Release the handle
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Convenience methods derived from the core trait
pub trait PackageFileSystemExt: PackageFileSystem {
    /// Check whether a path exists; errors other than not-found propagate
    fn exists(&self, path: &Path) -> Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_all(path)?;
        String::from_utf8(bytes).map_err(|e| FileSystemError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }
}

impl<T: PackageFileSystem + ?Sized> PackageFileSystemExt for T {}

/// Source of package filesystem handles
///
/// Each operation opens its own handle and releases it before returning;
/// handles are never cached on the entities built from them.
pub trait FileSystemProvider {
    /// Open a new handle
    fn open_fs(&self) -> Result<Box<dyn PackageFileSystem>>;

    /// Open a new handle that is closed when the guard goes out of scope
    fn open_scoped(&self) -> Result<ScopedFileSystem> {
        Ok(ScopedFileSystem::new(self.open_fs()?))
    }
}

/// Guard around an open handle; closes it exactly once
pub struct ScopedFileSystem {
    inner: Box<dyn PackageFileSystem>,
    closed: bool,
}

impl ScopedFileSystem {
    pub fn new(inner: Box<dyn PackageFileSystem>) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Close now and surface the close error instead of logging it
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.inner.close()
    }
}

impl Deref for ScopedFileSystem {
    type Target = dyn PackageFileSystem;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for ScopedFileSystem {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close() {
            tracing::warn!(error = %e, "failed to close package filesystem");
        }
    }
}

/// Pattern matching the immediate children of `dir`
///
/// Glob metacharacters in `dir` are escaped so directory names are matched
/// literally.
pub fn children_pattern(dir: &Path) -> PathBuf {
    let escaped = glob::Pattern::escape(&normalize(dir));
    if escaped.is_empty() {
        PathBuf::from("*")
    } else {
        PathBuf::from(format!("{}/*", escaped.trim_end_matches('/')))
    }
}

/// Normalize a path for glob matching: forward slashes, no leading `./`
pub(crate) fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.trim_start_matches("./").to_string()
}

pub(crate) fn compile_pattern(pattern: &Path) -> Result<glob::Pattern> {
    let pattern = normalize(pattern);
    glob::Pattern::new(&pattern).map_err(|source| FileSystemError::InvalidPattern { pattern, source })
}

pub(crate) const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};
