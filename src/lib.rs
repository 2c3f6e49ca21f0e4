/*!
 * pkgstream - data stream manifests for integration packages
 *
 * Loads the data streams a package declares and validates them against the
 * package contents:
 * - YAML manifest decoding with computed defaults
 * - Implicit `default` ingest pipeline binding
 * - Ingest pipeline existence and syntax checks
 * - Required field lookup across all field definition files
 *
 * The core lives in `pkgstream-core-manifest`; this crate adds packages on
 * disk, run configuration and logging.
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod package;

// Re-export commonly used types
pub use config::{LogLevel, OutputFormat, RunConfig};
pub use error::{PkgstreamError, Result};
pub use package::{DataStreamReport, Package};
pub use pkgstream_core_manifest::{DataStream, ValidationConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
