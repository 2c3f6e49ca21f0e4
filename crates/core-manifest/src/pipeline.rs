//! Ingest pipeline files
//!
//! Pipelines are only checked for being parseable documents; processor
//! definitions are not interpreted.

use crate::datastream::{DEFAULT_PIPELINE_NAME_JSON, DEFAULT_PIPELINE_NAME_YAML};
use crate::error::{Error, Result};
use pkgstream_core_interface::PackageFileSystem;
use std::path::Path;

/// Supported pipeline file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFormat {
    Json,
    Yaml,
}

impl PipelineFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(PipelineFormat::Json),
            "yml" => Ok(PipelineFormat::Yaml),
            _ => Err(Error::UnsupportedPipelineExtension {
                path: path.to_path_buf(),
                ext: if ext.is_empty() { ext } else { format!(".{ext}") },
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PipelineFormat::Json => "json",
            PipelineFormat::Yaml => "yml",
        }
    }
}

/// Whether `path` is one of the implicit default pipeline files
pub fn is_default_pipeline(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == DEFAULT_PIPELINE_NAME_JSON || n == DEFAULT_PIPELINE_NAME_YAML)
}

/// Parse `contents` as a key-value document of the given format
pub fn parse_pipeline(path: &Path, format: PipelineFormat, contents: &[u8]) -> Result<()> {
    match format {
        PipelineFormat::Json => serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(contents)
            .map(|_| ())
            .map_err(|e| Error::pipeline_syntax(path, e)),
        PipelineFormat::Yaml => serde_yaml::from_slice::<serde_yaml::Mapping>(contents)
            .map(|_| ())
            .map_err(|e| Error::pipeline_syntax(path, e)),
    }
}

/// Read a pipeline file and check that it parses
pub fn check_pipeline_file(fs: &dyn PackageFileSystem, path: &Path) -> Result<()> {
    let format = PipelineFormat::from_path(path)?;
    let contents = fs
        .read_all(path)
        .map_err(|e| Error::file_system("reading ingest pipeline file failed", path, e))?;
    parse_pipeline(path, format, &contents)?;
    tracing::debug!(path = %path.display(), ?format, "ingest pipeline file parsed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgstream_core_interface::MemoryFileSystem;
    use std::path::PathBuf;

    const DIR: &str = "data_stream/access/elasticsearch/ingest_pipeline";

    fn fs() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file(
                format!("{DIR}/default.json"),
                r#"{"description": "access", "processors": [{"set": {"field": "a", "value": 1}}]}"#,
            )
            .with_file(
                format!("{DIR}/default.yml"),
                "description: access\nprocessors:\n  - set:\n      field: a\n      value: 1\n",
            )
            .with_file(format!("{DIR}/broken.json"), r#"{"description": "#)
            .with_file(format!("{DIR}/list.json"), "[1, 2]")
            .with_file(format!("{DIR}/broken.yml"), "processors: [unclosed\n")
            .with_file(format!("{DIR}/notes.txt"), "hello")
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(PipelineFormat::from_path(Path::new("a/b.json")).unwrap(), PipelineFormat::Json);
        assert_eq!(PipelineFormat::from_path(Path::new("a/b.yml")).unwrap(), PipelineFormat::Yaml);

        let err = PipelineFormat::from_path(Path::new("a/b.yaml")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPipelineExtension { ref ext, .. } if ext == ".yaml"));
        assert!(PipelineFormat::from_path(Path::new("a/b")).is_err());
    }

    #[test]
    fn test_default_pipeline_names() {
        assert!(is_default_pipeline(Path::new("x/default.json")));
        assert!(is_default_pipeline(Path::new("x/default.yml")));
        assert!(!is_default_pipeline(Path::new("x/default.yaml")));
        assert!(!is_default_pipeline(Path::new("x/my-default.yml")));
    }

    #[test]
    fn test_valid_files_parse() {
        let fs = fs();
        check_pipeline_file(&fs, &PathBuf::from(format!("{DIR}/default.json"))).unwrap();
        check_pipeline_file(&fs, &PathBuf::from(format!("{DIR}/default.yml"))).unwrap();
    }

    #[test]
    fn test_syntax_errors_name_the_file() {
        let fs = fs();
        for name in ["broken.json", "broken.yml", "list.json"] {
            let path = PathBuf::from(format!("{DIR}/{name}"));
            let err = check_pipeline_file(&fs, &path).unwrap_err();
            assert!(matches!(err, Error::PipelineSyntax { .. }), "{name}: {err}");
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let fs = fs();
        let err = check_pipeline_file(&fs, &PathBuf::from(format!("{DIR}/notes.txt"))).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPipelineExtension { .. }));
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let fs = fs();
        let err = check_pipeline_file(&fs, &PathBuf::from(format!("{DIR}/nope.json"))).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }
}
