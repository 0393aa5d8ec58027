//! In-memory transformations over a loaded artifact.
//!
//! - [`apply_filters`]: case-insensitive substring filters, evaluated in parallel
//! - [`smart_sort`]: numeric-first stable sort
//! - [`reduce_values`]: per-group sum/avg/count/min/max
//! - [`coerce`]: permissive numeric views of cell values
//!
//! ## Example: filter → sort
//!
//! ```rust
//! use dataset_analytics::processing::{apply_filters, smart_sort, FilterSpec, SortSpec};
//! use dataset_analytics::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("city", DataType::Utf8),
//!     Field::new("sales", DataType::Utf8),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("Pune".into()), Value::Utf8("90".into())],
//!         vec![Value::Utf8("Delhi".into()), Value::Utf8("120".into())],
//!         vec![Value::Utf8("Durg".into()), Value::Utf8("7".into())],
//!     ],
//! );
//!
//! let mut filters = FilterSpec::new();
//! filters.insert("city".to_string(), "d".to_string());
//! let mut out = apply_filters(&ds, &filters);
//! smart_sort(&mut out, &SortSpec::new("sales", true));
//!
//! assert_eq!(out.rows[0][0], Value::Utf8("Delhi".into()));
//! assert_eq!(out.rows[1][0], Value::Utf8("Durg".into()));
//! ```

pub mod coerce;
pub mod filter;
pub mod reduce;
pub mod sort;

pub use filter::{FilterSpec, apply_filters};
pub use reduce::{ReduceOp, reduce_values, round2};
pub use sort::{SortSpec, smart_sort};
