//! In-memory package fixtures shared by the unit tests

use crate::loader::PackageSource;
use pkgstream_core_interface::{FileSystemProvider, MemoryFileSystem, PackageFileSystem};

/// Data stream directory used by every fixture
pub(crate) const BASE: &str = "data_stream/access";

/// Field definitions satisfying every required field
pub(crate) const BASE_FIELDS: &str = "\
- name: data_stream.type
  type: constant_keyword
- name: data_stream.dataset
  type: constant_keyword
- name: data_stream.namespace
  type: constant_keyword
- name: '@timestamp'
  type: date
";

pub(crate) struct TestPackage {
    name: String,
    pub fs: MemoryFileSystem,
}

impl TestPackage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fs: MemoryFileSystem::new(),
        }
    }

    pub fn manifest(mut self, contents: &str) -> Self {
        self.fs.insert(format!("{BASE}/manifest.yml"), contents);
        self
    }

    pub fn pipeline(mut self, file: &str, contents: &str) -> Self {
        self.fs
            .insert(format!("{BASE}/elasticsearch/ingest_pipeline/{file}"), contents);
        self
    }

    pub fn field_file(mut self, file: &str, contents: &str) -> Self {
        self.fs.insert(format!("{BASE}/fields/{file}"), contents);
        self
    }
}

impl FileSystemProvider for TestPackage {
    fn open_fs(&self) -> pkgstream_core_interface::Result<Box<dyn PackageFileSystem>> {
        self.fs.open_fs()
    }
}

impl PackageSource for TestPackage {
    fn package_name(&self) -> &str {
        &self.name
    }
}
