//! Package backed by a directory on the local filesystem

use crate::{
    compile_pattern, normalize, FileMetadata, FileSystemError, FileSystemProvider,
    PackageFileSystem, Result, MATCH_OPTIONS,
};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read-only view of a package directory
///
/// Every path handed to this type is resolved against `root`, and every path
/// it returns is relative to `root` again.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl PackageFileSystem for LocalFileSystem {
    fn stat(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(self.resolve(path)).map_err(|e| FileSystemError::from_io(path, e))?;
        if meta.is_dir() {
            Ok(FileMetadata::directory(path))
        } else {
            Ok(FileMetadata::file(path, meta.len()))
        }
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        // Validate the package-relative form first so errors name what the caller passed
        compile_pattern(pattern)?;

        let root = glob::Pattern::escape(&normalize(&self.root));
        let full = if root.is_empty() {
            normalize(pattern)
        } else {
            format!("{}/{}", root.trim_end_matches('/'), normalize(pattern))
        };

        let entries = glob::glob_with(&full, MATCH_OPTIONS).map_err(|source| {
            FileSystemError::InvalidPattern {
                pattern: full.clone(),
                source,
            }
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let found = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                FileSystemError::from_io(path, io::Error::from(e))
            })?;
            let relative = relative_to(&self.root, &found).ok_or_else(|| {
                FileSystemError::System(format!(
                    "glob match {} is outside package root {}",
                    found.display(),
                    self.root.display()
                ))
            })?;
            matches.push(relative);
        }
        matches.sort();
        Ok(matches)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(self.resolve(path)).map_err(|e| FileSystemError::from_io(path, e))
    }
}

/// `found` with the `root` prefix removed, comparing components and
/// ignoring `.` so `./pkg` and `pkg` name the same root
fn relative_to(root: &Path, found: &Path) -> Option<PathBuf> {
    let mut rest = found.components().filter(is_not_cur_dir);
    for part in root.components().filter(is_not_cur_dir) {
        if rest.next() != Some(part) {
            return None;
        }
    }
    Some(rest.collect())
}

fn is_not_cur_dir(c: &Component<'_>) -> bool {
    !matches!(c, Component::CurDir)
}

impl FileSystemProvider for LocalFileSystem {
    fn open_fs(&self) -> Result<Box<dyn PackageFileSystem>> {
        let meta = fs::metadata(&self.root).map_err(|e| FileSystemError::from_io(&self.root, e))?;
        if !meta.is_dir() {
            return Err(FileSystemError::System(format!(
                "package root is not a directory: {}",
                self.root.display()
            )));
        }
        Ok(Box::new(self.clone()))
    }
}
