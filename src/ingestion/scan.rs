//! Sheet scanner: lists the sheets of a source without reading row data.

use serde::Serialize;

use super::format::{DELIMITED_SHEET_NAME, SourceFormat};
use crate::error::{DatasetError, DatasetResult};

/// Sheet names of a source plus the engine that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetMetadata {
    pub sheets: Vec<String>,
    pub engine: String,
}

impl SheetMetadata {
    /// Delimited-text files always have one implicit sheet.
    pub fn delimited() -> Self {
        Self {
            sheets: vec![DELIMITED_SHEET_NAME.to_string()],
            engine: "csv".to_string(),
        }
    }
}

/// List the sheets of `source_key`.
///
/// `fetch` is only called for spreadsheets; delimited-text sources resolve from the key alone.
pub fn scan_source<F>(source_key: &str, fetch: F) -> DatasetResult<SheetMetadata>
where
    F: FnOnce() -> DatasetResult<Vec<u8>>,
{
    let format = SourceFormat::detect(source_key)?;
    if !format.is_spreadsheet() {
        return Ok(SheetMetadata::delimited());
    }
    let bytes = fetch()?;
    scan_spreadsheet(source_key, &bytes)
}

/// Run the default lister chain over spreadsheet bytes.
#[cfg(feature = "excel")]
pub fn scan_spreadsheet(source_key: &str, bytes: &[u8]) -> DatasetResult<SheetMetadata> {
    use super::excel::{AutoLister, ProbeLister};

    scan_with(&[&AutoLister, &ProbeLister], source_key, bytes)
}

#[cfg(not(feature = "excel"))]
pub fn scan_spreadsheet(source_key: &str, _bytes: &[u8]) -> DatasetResult<SheetMetadata> {
    Err(DatasetError::invalid(format!(
        "cannot scan '{source_key}': excel support not enabled (enable cargo feature 'excel')"
    )))
}

/// Try each lister in order; the first success wins.
///
/// Fails with [`DatasetError::CorruptSource`] carrying the last lister's message when all fail.
#[cfg(feature = "excel")]
pub fn scan_with(
    listers: &[&dyn super::excel::SheetLister],
    source_key: &str,
    bytes: &[u8],
) -> DatasetResult<SheetMetadata> {
    let mut last_error = String::from("no sheet listing strategy configured");
    for lister in listers {
        match lister.list(source_key, bytes) {
            Ok(sheets) => {
                tracing::debug!(
                    source = source_key,
                    engine = lister.engine(),
                    sheets = sheets.len(),
                    "scanned"
                );
                return Ok(SheetMetadata {
                    sheets,
                    engine: lister.engine().to_string(),
                });
            }
            Err(message) => {
                tracing::warn!(
                    source = source_key,
                    engine = lister.engine(),
                    error = %message,
                    "sheet listing failed, trying next strategy"
                );
                last_error = message;
            }
        }
    }
    Err(DatasetError::CorruptSource { message: last_error })
}
