use thiserror::Error;

/// Convenience result type used across the crate.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error type returned by scanning, conversion, storage and query operations.
///
/// This is a single error enum shared by every component. The service layer turns it into the
/// structured `{status: "error", message}` payload using the [`std::fmt::Display`] text.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The source key does not carry a recognized delimited-text or spreadsheet extension.
    #[error("unsupported format: '{key}' is not an Excel or CSV file")]
    UnsupportedFormat { key: String },

    /// Every sheet-listing strategy failed for a spreadsheet.
    #[error("Corrupt file: {message}")]
    CorruptSource { message: String },

    /// A sheet lookup by name failed. Conversion degrades to the first sheet instead of
    /// propagating this.
    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    /// A target column has no numeric interpretation.
    #[error("Column '{column}' contains non-numbers.")]
    SchemaCoercion { column: String },

    /// A group-by or target column is not part of the artifact schema.
    #[error("Column '{column}' not found")]
    ColumnNotFound { column: String },

    /// The object store is unreachable or the object is absent.
    #[error("storage error: {message}")]
    StorageIo { message: String },

    /// Source bytes could not be turned into an artifact.
    #[error("conversion failed: {message}")]
    Conversion { message: String },

    /// A request parameter is out of range or unrecognized.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Underlying local I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet reader error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Delimited-text reader/writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact encoding/decoding error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Payload or job-result serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatasetError {
    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::StorageIo {
            message: message.into(),
        }
    }

    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn column_not_found(column: &str) -> Self {
        Self::ColumnNotFound {
            column: column.to_owned(),
        }
    }
}
