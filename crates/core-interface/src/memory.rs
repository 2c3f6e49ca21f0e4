//! In-memory package, used by tests and by callers that already hold the
//! package contents (an unpacked upload, a generated fixture)

use crate::{
    compile_pattern, normalize, FileMetadata, FileSystemError, FileSystemProvider,
    PackageFileSystem, Result, MATCH_OPTIONS,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Package held entirely in memory
///
/// Directories are implied by the files beneath them. Cloning is cheap and
/// clones share contents until one of them is modified.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<BTreeMap<String, Vec<u8>>>,
    open: Arc<AtomicUsize>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        Arc::make_mut(&mut self.files).insert(normalize(path.as_ref()), contents.into());
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        Arc::make_mut(&mut self.files)
            .remove(&normalize(path.as_ref()))
            .is_some()
    }

    /// Number of handles opened through [`FileSystemProvider`] and not yet closed
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn is_dir(&self, key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        let prefix = format!("{}/", key.trim_end_matches('/'));
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    /// Every file plus every directory implied by a file
    fn entries(&self) -> BTreeSet<String> {
        let mut all = BTreeSet::new();
        for key in self.files.keys() {
            let mut current = key.as_str();
            all.insert(current.to_string());
            while let Some(idx) = current.rfind('/') {
                current = &current[..idx];
                if !all.insert(current.to_string()) {
                    break;
                }
            }
        }
        all
    }
}

impl PackageFileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> Result<FileMetadata> {
        let key = normalize(path);
        if let Some(contents) = self.files.get(&key) {
            return Ok(FileMetadata::file(path, contents.len() as u64));
        }
        if self.is_dir(&key) {
            return Ok(FileMetadata::directory(path));
        }
        Err(FileSystemError::NotFound(path.to_path_buf()))
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        let compiled = compile_pattern(pattern)?;
        Ok(self
            .entries()
            .into_iter()
            .filter(|entry| compiled.matches_with(entry, MATCH_OPTIONS))
            .map(PathBuf::from)
            .collect())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        let key = normalize(path);
        match self.files.get(&key) {
            Some(contents) => Ok(contents.clone()),
            None if self.is_dir(&key) => Err(FileSystemError::System(format!(
                "cannot read a directory: {}",
                path.display()
            ))),
            None => Err(FileSystemError::NotFound(path.to_path_buf())),
        }
    }
}

/// Handle handed out by [`MemoryFileSystem::open_fs`]
struct MemoryHandle {
    inner: MemoryFileSystem,
    closed: bool,
}

impl PackageFileSystem for MemoryHandle {
    fn stat(&self, path: &Path) -> Result<FileMetadata> {
        self.inner.stat(path)
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        self.inner.glob(pattern)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read_all(path)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.inner.open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl FileSystemProvider for MemoryFileSystem {
    fn open_fs(&self) -> Result<Box<dyn PackageFileSystem>> {
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            inner: self.clone(),
            closed: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackageFileSystemExt;

    fn fixture() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file("data_stream/access/manifest.yml", "title: Access")
            .with_file("data_stream/access/fields/base.yml", "- name: a")
            .with_file("data_stream/access/fields/sub/deep.yml", "- name: b")
            .with_file("data_stream/error/manifest.yml", "title: Error")
    }

    #[test]
    fn test_stat_files_and_implied_dirs() {
        let fs = fixture();
        assert!(!fs.stat(Path::new("data_stream/access/manifest.yml")).unwrap().is_dir);
        assert!(fs.stat(Path::new("data_stream/access")).unwrap().is_dir);
        assert!(fs.stat(Path::new("./data_stream")).unwrap().is_dir);
        assert!(fs.stat(Path::new("data_stream/acc")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_glob_is_not_recursive() {
        let fs = fixture();
        let found = fs.glob(Path::new("data_stream/access/fields/*")).unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("data_stream/access/fields/base.yml"),
                PathBuf::from("data_stream/access/fields/sub"),
            ]
        );

        let streams = fs.glob(Path::new("data_stream/*")).unwrap();
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn test_glob_invalid_pattern() {
        let fs = fixture();
        let err = fs.glob(Path::new("data_stream/[")).unwrap_err();
        assert!(matches!(err, FileSystemError::InvalidPattern { .. }));
    }

    #[test]
    fn test_read_all_and_remove() {
        let mut fs = fixture();
        assert_eq!(
            fs.read_to_string(Path::new("data_stream/error/manifest.yml")).unwrap(),
            "title: Error"
        );
        assert!(fs.remove("data_stream/error/manifest.yml"));
        assert!(!fs.exists(Path::new("data_stream/error")).unwrap());
        assert!(fs.read_all(Path::new("data_stream/error/manifest.yml")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let original = fixture();
        let mut copy = original.clone();
        copy.insert("extra.yml", "x");
        assert!(copy.exists(Path::new("extra.yml")).unwrap());
        assert!(!original.exists(Path::new("extra.yml")).unwrap());
    }

    #[test]
    fn test_handle_accounting() {
        let fs = fixture();
        let mut handle = fs.open_fs().unwrap();
        assert_eq!(fs.open_handles(), 1);
        handle.close().unwrap();
        handle.close().unwrap();
        assert_eq!(fs.open_handles(), 0);
    }
}
