//! Data stream validation
//!
//! Validation is an explicit pass over a loaded data stream. Checks run in
//! order and stop at the first failure:
//!
//! 1. dataset naming
//! 2. data stream type
//! 3. existence and syntax of the referenced ingest pipelines
//! 4. presence and type of the required fields

use crate::datastream::DataStream;
use crate::error::{Error, Result};
use crate::fields::FieldSchema;
use crate::pipeline::{check_pipeline_file, PipelineFormat};
use pkgstream_core_interface::{FileSystemProvider, PackageFileSystem};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Fields every data stream must define, with their expected types
pub const REQUIRED_FIELDS: [(&str, &str); 4] = [
    ("data_stream.type", "constant_keyword"),
    ("data_stream.dataset", "constant_keyword"),
    ("data_stream.namespace", "constant_keyword"),
    ("@timestamp", "date"),
];

/// Validation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// When false every validation call succeeds without looking at anything
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ValidationConfig {
    /// Skip validation entirely, for trusted sources
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Validates data streams of one package
pub struct Validator<'a> {
    source: &'a dyn FileSystemProvider,
    config: ValidationConfig,
}

impl<'a> Validator<'a> {
    pub fn new(source: &'a dyn FileSystemProvider, config: ValidationConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> ValidationConfig {
        self.config
    }

    pub fn validate(&self, ds: &DataStream) -> Result<()> {
        if !self.config.enabled {
            debug!(dataset = %ds.dataset, "validation disabled, skipping");
            return Ok(());
        }

        if ds.dataset.contains('-') {
            return Err(Error::InvalidDatasetName(ds.dataset.clone()));
        }

        ds.data_stream_type()?;

        let fs = self
            .source
            .open_scoped()
            .map_err(|e| Error::file_system("opening package filesystem failed", &ds.base_path, e))?;

        let pipeline_dir = ds.ingest_pipeline_dir();
        for name in ds.ingest_pipeline_names() {
            check_pipeline_exists(&*fs, &pipeline_dir, name)?;
        }

        check_required_fields(&*fs, ds).map_err(|e| Error::RequiredFields(Box::new(e)))?;

        debug!(dataset = %ds.dataset, "data stream is valid");
        Ok(())
    }
}

impl DataStream {
    /// Validate against the package the data stream was loaded from
    pub fn validate(&self, source: &dyn FileSystemProvider, config: ValidationConfig) -> Result<()> {
        Validator::new(source, config).validate(self)
    }
}

/// At least one of `<name>.json` / `<name>.yml` must exist, and every one
/// that exists must parse
fn check_pipeline_exists(fs: &dyn PackageFileSystem, dir: &Path, name: &str) -> Result<()> {
    let mut found = false;
    for format in [PipelineFormat::Json, PipelineFormat::Yaml] {
        let path = dir.join(format!("{name}.{}", format.extension()));
        match fs.stat(&path) {
            Ok(_) => {
                check_pipeline_file(fs, &path)?;
                found = true;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(Error::file_system("stat ingest pipeline file failed", path, e)),
        }
    }

    if !found {
        return Err(Error::PipelineNotFound { path: dir.join(name) });
    }
    Ok(())
}

/// Every required field is looked up; the first failure is returned
fn check_required_fields(fs: &dyn PackageFileSystem, ds: &DataStream) -> Result<()> {
    let schema = FieldSchema::load(fs, &ds.fields_dir())?;

    let mut first_error = None;
    for (name, expected) in REQUIRED_FIELDS {
        if let Err(e) = schema.require(name, expected) {
            debug!(dataset = %ds.dataset, field = name, error = %e, "required field check failed");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestPackage, BASE, BASE_FIELDS};

    fn valid_package() -> TestPackage {
        TestPackage::new("nginx")
            .manifest("title: Access\ntype: logs\n")
            .field_file("base-fields.yml", BASE_FIELDS)
    }

    fn load_and_validate(pkg: &TestPackage) -> Result<()> {
        let ds = DataStream::load(BASE, pkg)?;
        ds.validate(pkg, ValidationConfig::default())
    }

    #[test]
    fn test_valid_for_every_type() {
        for kind in ["logs", "metrics", "synthetics", "traces"] {
            let pkg = valid_package().manifest(&format!("title: Access\ntype: {kind}\n"));
            load_and_validate(&pkg).unwrap();
            assert_eq!(pkg.fs.open_handles(), 0);
        }
    }

    #[test]
    fn test_dash_in_dataset_always_fails() {
        let pkg = valid_package().manifest("title: Access\ntype: logs\ndataset: my-app\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::InvalidDatasetName(ref d) if d == "my-app"));

        let pkg = TestPackage::new("nginx").manifest("title: Access\ntype: bogus\ndataset: my-app\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::InvalidDatasetName(_)));
    }

    #[test]
    fn test_dash_from_package_name() {
        let pkg = TestPackage::new("my-package")
            .manifest("title: Access\ntype: logs\n")
            .field_file("base-fields.yml", BASE_FIELDS);
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::InvalidDatasetName(ref d) if d == "my-package.access"));
    }

    #[test]
    fn test_invalid_type_names_value() {
        let pkg = valid_package().manifest("title: Access\ntype: events\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::InvalidType(ref t) if t == "events"));
    }

    #[test]
    fn test_disabled_skips_everything() {
        let pkg = TestPackage::new("nginx").manifest("title: Access\ntype: bogus\ndataset: a-b\n");
        let ds = DataStream::load(BASE, &pkg).unwrap();
        ds.validate(&pkg, ValidationConfig::disabled()).unwrap();
        assert!(ds.validate(&pkg, ValidationConfig::default()).is_err());
    }

    #[test]
    fn test_default_pipeline_validated() {
        let pkg = valid_package().pipeline("default.json", r#"{"processors": []}"#);
        load_and_validate(&pkg).unwrap();

        let pkg = valid_package().pipeline("default.json", r#"{"processors": "#);
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::PipelineSyntax { ref path, .. } if path.ends_with("default.json")));
    }

    #[test]
    fn test_both_pipeline_formats_checked() {
        let pkg = valid_package()
            .manifest("title: Access\ntype: logs\ningest_pipeline: main\n")
            .pipeline("main.json", "{}")
            .pipeline("main.yml", "processors: [\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::PipelineSyntax { ref path, .. } if path.ends_with("main.yml")));
        assert_eq!(pkg.fs.open_handles(), 0);
    }

    #[test]
    fn test_missing_pipeline() {
        let pkg = valid_package().manifest("title: Access\ntype: logs\ningest_pipeline: ghost\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::PipelineNotFound { ref path } if path.ends_with("ingest_pipeline/ghost")));
    }

    #[test]
    fn test_elasticsearch_pipeline_name_checked() {
        let pkg = valid_package()
            .manifest("title: Access\ntype: logs\nelasticsearch:\n  ingest_pipeline:\n    name: ghost\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(matches!(err, Error::PipelineNotFound { .. }));

        let pkg = valid_package()
            .manifest("title: Access\ntype: logs\nelasticsearch:\n  ingest_pipeline:\n    name: main\n")
            .pipeline("main.yml", "processors: []\n");
        load_and_validate(&pkg).unwrap();
    }

    #[test]
    fn test_missing_fields_wrapped() {
        let pkg = TestPackage::new("nginx").manifest("title: Access\ntype: logs\n");
        let err = load_and_validate(&pkg).unwrap_err();
        match err {
            Error::RequiredFields(inner) => {
                assert!(matches!(*inner, Error::FieldNotFound(ref n) if n == "data_stream.type"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_required_failure_is_reported() {
        let pkg = TestPackage::new("nginx").manifest("title: Access\ntype: logs\n").field_file(
            "base-fields.yml",
            "- name: data_stream.type\n  type: constant_keyword\n- name: data_stream.dataset\n  type: keyword\n- name: '@timestamp'\n  type: keyword\n",
        );
        let err = load_and_validate(&pkg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Validating required fields failed"));
        assert!(msg.contains("'data_stream.dataset'"));
        assert!(msg.contains("expected: constant_keyword, got: keyword"));
    }

    #[test]
    fn test_required_fields_across_files_and_nesting() {
        let pkg = TestPackage::new("nginx")
            .manifest("title: Access\ntype: logs\n")
            .field_file(
                "a.yml",
                "- name: data_stream\n  type: group\n  fields:\n    - name: type\n      type: constant_keyword\n    - name: dataset\n      type: constant_keyword\n",
            )
            .field_file(
                "b.yml",
                "- name: data_stream.namespace\n  type: constant_keyword\n- name: '@timestamp'\n  type: date\n",
            );
        load_and_validate(&pkg).unwrap();
    }

    #[test]
    fn test_field_in_later_file_is_found() {
        // Required fields only in the last file in path order
        let pkg = TestPackage::new("nginx")
            .manifest("title: Access\ntype: logs\n")
            .field_file("a.yml", "- name: message\n  type: text\n")
            .field_file("b.yml", "- name: host.name\n  type: keyword\n")
            .field_file("c.yml", BASE_FIELDS);
        load_and_validate(&pkg).unwrap();

        let pkg = TestPackage::new("nginx")
            .manifest("title: Access\ntype: logs\n")
            .field_file(
                "a.yml",
                "- name: data_stream.type\n  type: constant_keyword\n- name: data_stream.dataset\n  type: constant_keyword\n",
            )
            .field_file("b.yml", "- name: message\n  type: text\n");
        let err = load_and_validate(&pkg).unwrap_err();
        assert!(err.to_string().contains("data_stream.namespace"));
    }
}
