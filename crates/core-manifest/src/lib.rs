//! Data stream manifests for pkgstream
//!
//! This crate loads the data streams declared by an integration package and
//! validates them against the package contents.
//!
//! # Key Concepts
//!
//! - **Data stream**: typed ingestion target described by `data_stream/<name>/manifest.yml`
//! - **Field schema**: field definitions collected from every file under `fields/`
//! - **Ingest pipeline**: JSON or YAML document under `elasticsearch/ingest_pipeline/`
//!
//! Loading never validates beyond the release channel and orphaned pipeline
//! files; validation is a separate, explicit step controlled by
//! [`ValidationConfig`].
//!
//! # Example
//!
//! ```no_run
//! use pkgstream_core_manifest::{DataStream, PackageSource, ValidationConfig};
//!
//! fn check<P: PackageSource>(package: &P) -> pkgstream_core_manifest::Result<()> {
//!     let ds = DataStream::load("data_stream/access", package)?;
//!     ds.validate(package, ValidationConfig::default())
//! }
//! ```

pub mod datastream;
pub mod decode;
pub mod error;
pub mod fields;
pub mod loader;
pub mod pipeline;
pub mod release;
pub mod validator;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use datastream::{
    DataStream, DataStreamType, Elasticsearch, ElasticsearchPrivileges, IndexTemplate,
    IngestPipelineRef, Stream, Variable,
};
pub use decode::{decode_yaml, DecodeError, PostDecode};
pub use error::{Error, ErrorCategory, Result};
pub use fields::{FieldEntry, FieldNode, FieldSchema};
pub use loader::PackageSource;
pub use pipeline::PipelineFormat;
pub use validator::{ValidationConfig, Validator, REQUIRED_FIELDS};
