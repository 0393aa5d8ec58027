//! Source format detection and artifact naming.

use crate::error::{DatasetError, DatasetResult};

/// Suffixes stripped from a source key when deriving its artifact name.
const RAW_SUFFIXES: &[&str] = &[".xlsx", ".xlsm", ".xlsb", ".xls", ".ods", ".csv", ".tsv"];

/// Name of the single implicit sheet of a delimited-text file.
pub const DELIMITED_SHEET_NAME: &str = "Sheet1";

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Spreadsheet/workbook formats.
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format of a source key from its extension.
    pub fn detect(key: &str) -> DatasetResult<Self> {
        key.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| DatasetError::UnsupportedFormat {
                key: key.to_string(),
            })
    }

    pub fn is_spreadsheet(&self) -> bool {
        matches!(self, Self::Excel)
    }

    /// Field delimiter for delimited-text formats.
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
            Self::Excel => None,
        }
    }
}

/// Deterministic artifact name for a (source key, sheet) pair.
///
/// The raw-format suffix is stripped, path separators become `_`, and the sheet name is appended:
/// `reports/q1.xlsx` + `Data` → `reports_q1_Data.parquet`.
pub fn artifact_name(source_key: &str, sheet_name: &str) -> String {
    let lower = source_key.to_ascii_lowercase();
    let stem = RAW_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &source_key[..source_key.len() - suffix.len()])
        .unwrap_or(source_key);

    format!("{}_{}.parquet", flatten_separators(stem), flatten_separators(sheet_name))
}

fn flatten_separators(s: &str) -> String {
    s.replace(['/', '\\'], "_")
}
