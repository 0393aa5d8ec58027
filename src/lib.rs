//! `dataset-analytics` turns messy tabular uploads (CSV/TSV and spreadsheet sheets) into
//! Parquet artifacts, then answers browsing and summary queries against them.
//!
//! The primary entrypoint is [`service::DatasetService`], which wires an
//! [`storage::ObjectStore`] to the ingestion and query layers and exposes one method per
//! operation:
//!
//! - **list raw files**: uploads in the raw bucket, with size in MiB
//! - **scan**: sheet names of an upload, without reading row data
//! - **convert**: one (upload, sheet) → one Parquet artifact in the processed bucket
//! - **view**: filter, smart-sort and paginate an artifact
//! - **aggregate**: group by one column and sum/avg/count/min/max another
//! - **unique values**: distinct values of one column, for filter dropdowns
//!
//! Conversions can also run in the background through [`jobs::JobRunner`].
//!
//! ## What gets converted
//!
//! **Source formats (detected by extension):**
//!
//! - **Delimited text**: `.csv`, `.tsv`
//! - **Spreadsheets** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xlsm`,
//!   `.xlsb`, `.xls`, `.ods`
//!
//! Delimited text keeps inferred column kinds ([`types::DataType::Int64`],
//! [`types::DataType::Float64`], [`types::DataType::Bool`], [`types::DataType::Utf8`]).
//! Spreadsheet sheets are read as text after locating the real header row below any title
//! banners. In both cases `""`, `null`, `NULL` and `N/A` become missing values, column names are
//! trimmed and made unique, and rows with no values are dropped.
//!
//! ## Quick example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dataset_analytics::config::Settings;
//! use dataset_analytics::query::{AggregateRequest, ViewRequest};
//! use dataset_analytics::service::DatasetService;
//! use dataset_analytics::storage::{MemoryObjectStore, ObjectStore};
//!
//! # fn main() -> Result<(), dataset_analytics::DatasetError> {
//! let store = Arc::new(MemoryObjectStore::new());
//! store.put("raw-datasets", "sales.csv", b"region,amount\nA,10\nA,5\nB,x\n".to_vec())?;
//!
//! let service = DatasetService::new(store, Settings::default());
//! let report = service.convert("sales.csv", "Sheet1")?;
//! assert_eq!(report.processed_file, "sales_Sheet1.parquet");
//!
//! let page = service.view(&report.processed_file, &ViewRequest::default())?;
//! assert_eq!(page.total_rows, 3);
//!
//! let agg = service.aggregate(
//!     &report.processed_file,
//!     &AggregateRequest::new("region", "sum", "amount"),
//! )?;
//! assert_eq!(agg.y_key, "sum_amount");
//! assert_eq!(agg.data.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`service`]: operation facade and `{status: ...}` payloads
//! - [`ingestion`]: format detection, sheet scanning, conversion
//! - [`artifact`]: Parquet encoding/decoding of converted datasets
//! - [`processing`]: filtering, sorting and reductions over a loaded dataset
//! - [`query`]: view / aggregate / unique-values
//! - [`storage`]: object-store trait plus in-memory and filesystem implementations
//! - [`jobs`]: background conversion with retries
//! - [`observability`]: observer hooks and `tracing` setup
//! - [`config`]: settings with environment overrides
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: the crate-wide error type

pub mod artifact;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod jobs;
pub mod observability;
pub mod processing;
pub mod query;
pub mod service;
pub mod storage;
pub mod types;

pub use error::{DatasetError, DatasetResult};
