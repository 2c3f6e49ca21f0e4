//! Data stream data structures
//!
//! A data stream is a typed ingestion target declared by a package. It lives in
//! its own directory (`data_stream/<name>/`) with a `manifest.yml`, a `fields/`
//! directory of field definitions and optional Elasticsearch assets such as
//! ingest pipelines.

use crate::decode::{require_non_empty, DecodeError, PostDecode};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const MANIFEST_FILE: &str = "manifest.yml";
pub const DIR_FIELDS: &str = "fields";
pub const DIR_ELASTICSEARCH: &str = "elasticsearch";
pub const DIR_INGEST_PIPELINE: &str = "ingest_pipeline";

pub const DEFAULT_PIPELINE_NAME: &str = "default";
pub const DEFAULT_PIPELINE_NAME_JSON: &str = "default.json";
pub const DEFAULT_PIPELINE_NAME_YAML: &str = "default.yml";

/// Agent template used by a stream that does not name one
pub const DEFAULT_TEMPLATE_PATH: &str = "stream.yml.hbs";

/// Data stream manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataStream {
    /// Data stream type; kept as written so unknown values reach validation
    #[serde(rename = "type")]
    pub kind: String,

    /// Dataset name, `{package}.{path}` unless set
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dataset: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ilm_policy: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub dataset_is_prefix: bool,

    pub title: String,

    /// Release channel (experimental, beta, ga)
    #[serde(default)]
    pub release: String,

    /// Legacy pipeline name, superseded by `elasticsearch.ingest_pipeline.name`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ingest_pipeline: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<Stream>,

    /// Name of the owning package
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<Elasticsearch>,

    /// Directory name of the data stream
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Directory of the data stream, relative to the package root
    #[serde(skip)]
    pub base_path: PathBuf,
}

/// Binding of an input to this data stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stream {
    /// Input type this stream is configured for
    pub input: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<Variable>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_stream: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Unset means enabled; filled in by the loader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Stream {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// User-configurable variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub multi: bool,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub show_user: bool,

    /// Default value of any shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Elasticsearch asset settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Elasticsearch {
    #[serde(default, skip_serializing_if = "IndexTemplate::is_empty")]
    pub index_template: IndexTemplate,

    #[serde(default, skip_serializing_if = "IngestPipelineRef::is_empty")]
    pub ingest_pipeline: IngestPipelineRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileges: Option<ElasticsearchPrivileges>,
}

impl Elasticsearch {
    /// Configured ingest pipeline, if any
    pub fn ingest_pipeline_name(&self) -> Option<&str> {
        let name = self.ingest_pipeline.name.as_str();
        (!name.is_empty()).then_some(name)
    }
}

/// Raw index template blobs, passed through unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Map<String, Value>>,
}

impl IndexTemplate {
    pub fn is_empty(&self) -> bool {
        self.settings.is_none() && self.mappings.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestPipelineRef {
    #[serde(default)]
    pub name: String,
}

impl IngestPipelineRef {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Index privileges the data stream needs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElasticsearchPrivileges {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<String>,
}

/// Recognised data stream types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataStreamType {
    Logs,
    Metrics,
    Synthetics,
    Traces,
}

impl DataStreamType {
    pub const ALL: [DataStreamType; 4] = [
        DataStreamType::Logs,
        DataStreamType::Metrics,
        DataStreamType::Synthetics,
        DataStreamType::Traces,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DataStreamType::Logs => "logs",
            DataStreamType::Metrics => "metrics",
            DataStreamType::Synthetics => "synthetics",
            DataStreamType::Traces => "traces",
        }
    }

    /// Human readable name
    pub fn title(&self) -> &'static str {
        match self {
            DataStreamType::Logs => "Logs",
            DataStreamType::Metrics => "Metrics",
            DataStreamType::Synthetics => "Synthetics",
            DataStreamType::Traces => "Traces",
        }
    }
}

impl FromStr for DataStreamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logs" => Ok(DataStreamType::Logs),
            "metrics" => Ok(DataStreamType::Metrics),
            "synthetics" => Ok(DataStreamType::Synthetics),
            "traces" => Ok(DataStreamType::Traces),
            _ => Err(Error::InvalidType(s.to_string())),
        }
    }
}

impl fmt::Display for DataStreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataStream {
    /// Parsed type, or `InvalidType` naming the raw value
    pub fn data_stream_type(&self) -> Result<DataStreamType> {
        self.kind.parse()
    }

    /// Configured pipeline names: the `elasticsearch` one first, then the
    /// legacy field when it names a different pipeline
    pub fn ingest_pipeline_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(2);
        if let Some(name) = self.elasticsearch.as_ref().and_then(Elasticsearch::ingest_pipeline_name) {
            names.push(name);
        }
        if !self.ingest_pipeline.is_empty() && !names.contains(&self.ingest_pipeline.as_str()) {
            names.push(self.ingest_pipeline.as_str());
        }
        names
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_path.join(MANIFEST_FILE)
    }

    pub fn fields_dir(&self) -> PathBuf {
        self.base_path.join(DIR_FIELDS)
    }

    pub fn ingest_pipeline_dir(&self) -> PathBuf {
        ingest_pipeline_dir(&self.base_path)
    }
}

pub fn ingest_pipeline_dir(base_path: &Path) -> PathBuf {
    base_path.join(DIR_ELASTICSEARCH).join(DIR_INGEST_PIPELINE)
}

impl PostDecode for DataStream {
    fn post_decode(&self) -> std::result::Result<(), DecodeError> {
        require_non_empty("type", &self.kind)?;
        require_non_empty("title", &self.title)?;
        for (i, stream) in self.streams.iter().enumerate() {
            require_non_empty(&format!("streams[{i}].input"), &stream.input)?;
        }
        Ok(())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
