/*!
 * Integration packages on disk
 *
 * A package is a directory with a `manifest.yml` and a `data_stream/`
 * directory holding one subdirectory per data stream. Every operation opens
 * a fresh filesystem handle for the package root; nothing is cached.
 */

use pkgstream_core_interface::{
    children_pattern, FileSystemProvider, LocalFileSystem, PackageFileSystem,
    Result as FileSystemResult,
};
use pkgstream_core_manifest::{
    decode::require_non_empty, decode_yaml, DataStream, DecodeError, Error as ManifestError,
    PackageSource, PostDecode, ValidationConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PkgstreamError, Result};

/// Package-level manifest file
pub const PACKAGE_MANIFEST_FILE: &str = "manifest.yml";

/// Directory holding the data streams of a package
pub const DATA_STREAM_DIR: &str = "data_stream";

/// The parts of the package manifest this tool reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub title: String,
}

impl PostDecode for PackageManifest {
    fn post_decode(&self) -> std::result::Result<(), DecodeError> {
        require_non_empty("name", &self.name)
    }
}

/// An integration package rooted at a local directory
#[derive(Debug, Clone)]
pub struct Package {
    manifest: PackageManifest,
    root: PathBuf,
}

/// Outcome of loading one data stream
#[derive(Debug)]
pub struct DataStreamReport {
    /// Data stream directory, relative to the package root
    pub path: PathBuf,
    pub result: std::result::Result<DataStream, ManifestError>,
}

impl DataStreamReport {
    /// Directory name of the data stream
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Package {
    /// Open the package at `root`, reading its name from `manifest.yml`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PkgstreamError::PackageNotFound(root));
        }

        let mut package = Self::with_name(String::new(), root);
        let manifest_path = package.root.join(PACKAGE_MANIFEST_FILE);
        let manifest_error = |message: String| PkgstreamError::PackageManifest {
            path: manifest_path.clone(),
            message,
        };

        let body = {
            let fs = package
                .open_scoped()
                .map_err(|e| manifest_error(e.to_string()))?;
            fs.read_all(Path::new(PACKAGE_MANIFEST_FILE))
                .map_err(|e| manifest_error(e.to_string()))?
        };
        package.manifest = decode_yaml(&body).map_err(|e| manifest_error(e.to_string()))?;

        debug!(
            package = %package.manifest.name,
            version = %package.manifest.version,
            root = %package.root.display(),
            "opened package"
        );
        Ok(package)
    }

    /// Use `name` without reading the package manifest
    pub fn with_name(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            manifest: PackageManifest {
                name: name.into(),
                ..Default::default()
            },
            root: root.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Data stream directories, relative to the package root, in path order
    pub fn data_stream_paths(&self) -> Result<Vec<PathBuf>> {
        let fs = self
            .open_scoped()
            .map_err(|e| ManifestError::file_system("opening package filesystem failed", &self.root, e))?;

        let dir = Path::new(DATA_STREAM_DIR);
        let entries = fs
            .glob(&children_pattern(dir))
            .map_err(|e| ManifestError::file_system("listing data streams failed", dir, e))?;

        let mut paths = Vec::with_capacity(entries.len());
        for entry in entries {
            let meta = fs
                .stat(&entry)
                .map_err(|e| ManifestError::file_system("stat data stream failed", &entry, e))?;
            if meta.is_dir {
                paths.push(entry);
            }
        }
        Ok(paths)
    }

    /// Load one data stream by directory name and validate it per `config`
    pub fn load_data_stream(&self, name: &str, config: &ValidationConfig) -> Result<DataStream> {
        let path = Path::new(DATA_STREAM_DIR).join(name);
        if !self.data_stream_paths()?.contains(&path) {
            return Err(PkgstreamError::DataStreamNotFound {
                package: self.name().to_string(),
                name: name.to_string(),
            });
        }
        Ok(self.load_and_validate(&path, config)?)
    }

    /// Load every data stream; a failure is recorded in its report and
    /// never stops the others
    pub fn load_data_streams(&self, config: &ValidationConfig) -> Result<Vec<DataStreamReport>> {
        let paths = self.data_stream_paths()?;
        let mut reports = Vec::with_capacity(paths.len());

        for path in paths {
            let result = self.load_and_validate(&path, config);
            if let Err(ref e) = result {
                warn!(
                    package = %self.name(),
                    path = %path.display(),
                    category = %e.category(),
                    error = %e,
                    "data stream failed"
                );
            }
            reports.push(DataStreamReport { path, result });
        }

        info!(
            package = %self.name(),
            total = reports.len(),
            failed = reports.iter().filter(|r| !r.is_ok()).count(),
            "loaded data streams"
        );
        Ok(reports)
    }

    fn load_and_validate(
        &self,
        path: &Path,
        config: &ValidationConfig,
    ) -> std::result::Result<DataStream, ManifestError> {
        let ds = DataStream::load(path, self)?;
        ds.validate(self, *config)?;
        Ok(ds)
    }
}

impl FileSystemProvider for Package {
    fn open_fs(&self) -> FileSystemResult<Box<dyn PackageFileSystem>> {
        LocalFileSystem::new(&self.root).open_fs()
    }
}

impl PackageSource for Package {
    fn package_name(&self) -> &str {
        self.name()
    }
}
