//! Data stream loading
//!
//! Loading reads `manifest.yml`, decodes it, fills in computed defaults and
//! resolves the implicit `default` ingest pipeline. Beyond the release
//! channel and orphaned pipeline files nothing is validated here; see
//! [`crate::validator`] for the explicit validation pass.

use crate::datastream::{
    ingest_pipeline_dir, DataStream, Elasticsearch, DEFAULT_PIPELINE_NAME, DEFAULT_TEMPLATE_PATH,
    MANIFEST_FILE,
};
use crate::decode::decode_yaml;
use crate::error::{Error, Result};
use crate::pipeline::is_default_pipeline;
use crate::release::{is_valid_release, DEFAULT_RELEASE};
use pkgstream_core_interface::{children_pattern, FileSystemProvider};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The package a data stream belongs to
///
/// Loading needs only the package name and a way to open its filesystem.
pub trait PackageSource: FileSystemProvider {
    fn package_name(&self) -> &str;
}

impl DataStream {
    /// Load the data stream rooted at `base_path` (relative to the package)
    pub fn load(base_path: impl AsRef<Path>, package: &dyn PackageSource) -> Result<DataStream> {
        let base_path = base_path.as_ref();
        let fs = package
            .open_scoped()
            .map_err(|e| Error::file_system("opening package filesystem failed", base_path, e))?;

        let manifest_path = base_path.join(MANIFEST_FILE);
        match fs.stat(&manifest_path) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Err(Error::manifest_not_found(manifest_path)),
            Err(e) => return Err(Error::file_system("stat manifest failed", manifest_path, e)),
        }

        let dir_name = base_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let body = fs
            .read_all(&manifest_path)
            .map_err(|e| Error::file_system("failed to read manifest", &manifest_path, e))?;

        let mut ds: DataStream = decode_yaml(&body).map_err(|source| Error::ManifestDecode {
            path: dir_name.clone(),
            package: package.package_name().to_string(),
            source,
        })?;

        ds.package = package.package_name().to_string();
        ds.path = dir_name;
        ds.base_path = base_path.to_path_buf();
        ds.fill_defaults();

        if !is_valid_release(&ds.release) {
            return Err(Error::InvalidRelease(ds.release));
        }

        let pipeline_dir = ingest_pipeline_dir(base_path);
        let pipelines = fs
            .glob(&children_pattern(&pipeline_dir))
            .map_err(|e| Error::file_system("listing ingest pipelines failed", &pipeline_dir, e))?;
        ds.resolve_default_pipeline(&pipelines);

        if ds.ingest_pipeline_names().is_empty() && !pipelines.is_empty() {
            return Err(Error::OrphanedPipelineFiles {
                dataset: ds.dataset,
                paths: pipelines,
            });
        }

        debug!(
            package = %ds.package,
            dataset = %ds.dataset,
            streams = ds.streams.len(),
            "loaded data stream"
        );
        Ok(ds)
    }

    /// Computed defaults: dataset, release, per-stream enabled flag and template
    fn fill_defaults(&mut self) {
        if self.dataset.is_empty() {
            self.dataset = format!("{}.{}", self.package, self.path);
        }
        if self.release.is_empty() {
            self.release = DEFAULT_RELEASE.to_string();
        }
        for stream in &mut self.streams {
            if stream.enabled.is_none() {
                stream.enabled = Some(true);
            }
            if stream.template_path.is_empty() {
                stream.template_path = DEFAULT_TEMPLATE_PATH.to_string();
            }
        }
    }

    /// Bind `default.json` / `default.yml` when no pipeline is named
    ///
    /// An `elasticsearch` block without a pipeline name takes the default
    /// and overrides the legacy name. Without a block, the default is bound
    /// to both names only while the legacy name is unset.
    fn resolve_default_pipeline(&mut self, pipelines: &[PathBuf]) {
        if !pipelines.iter().any(|p| is_default_pipeline(p)) {
            return;
        }

        let bind_both = match &self.elasticsearch {
            Some(es) => es.ingest_pipeline_name().is_none(),
            None => self.ingest_pipeline.is_empty(),
        };

        if bind_both {
            debug!(dataset = %self.dataset, "binding implicit default ingest pipeline");
            self.elasticsearch
                .get_or_insert_with(Elasticsearch::default)
                .ingest_pipeline
                .name = DEFAULT_PIPELINE_NAME.to_string();
            self.ingest_pipeline = DEFAULT_PIPELINE_NAME.to_string();
        } else if self.ingest_pipeline.is_empty() {
            self.ingest_pipeline = DEFAULT_PIPELINE_NAME.to_string();
        }
    }
}
