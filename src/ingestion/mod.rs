//! Ingestion: format detection, sheet scanning and conversion of raw files.
//!
//! Most callers should go through [`crate::service::DatasetService`]. The pieces are usable on
//! their own:
//!
//! - [`format`]: source format detection and artifact naming
//! - [`scan`]: sheet listing without reading row data
//! - [`convert`]: raw bytes → normalized [`crate::types::DataSet`]
//! - [`csv`]: tolerant delimited-text reader
//! - [`header`]: header-row detection for spreadsheet exports
//! - `excel`: spreadsheet access (feature `excel`)

pub mod convert;
pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod format;
pub mod header;
pub mod scan;

pub use convert::{Conversion, ConversionReport, ConvertOptions, convert_source};
pub use format::{SourceFormat, artifact_name};
pub use scan::{SheetMetadata, scan_source};
