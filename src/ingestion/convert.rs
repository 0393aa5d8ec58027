//! Tabular converter: raw bytes + sheet name in, normalized [`DataSet`] + report out.
//!
//! Delimited text is read directly with kind inference. Spreadsheets go through an intermediate
//! tab-delimited buffer: the header row is located first, then the sheet is read as text from
//! that row on. Both paths share the same post-processing (column name cleanup, all-missing row
//! removal).

use std::collections::HashSet;

use serde::Serialize;

use super::csv::{DEFAULT_INFER_SCHEMA_ROWS, DelimitedOptions, read_delimited};
use super::format::{SourceFormat, artifact_name};
use super::header::DEFAULT_HEADER_SCAN_ROWS;
use crate::config::Settings;
use crate::error::{DatasetError, DatasetResult};
use crate::types::DataSet;

/// Options controlling conversion.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Data rows sampled for kind inference on delimited text.
    pub infer_schema_rows: usize,
    /// Rows inspected when looking for a spreadsheet header.
    pub header_scan_rows: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
        }
    }
}

impl From<&Settings> for ConvertOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            infer_schema_rows: settings.csv_infer_schema_rows,
            header_scan_rows: settings.header_scan_rows,
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Sheet that was requested.
    pub original_sheet: String,
    /// Artifact name in the processed bucket.
    pub processed_file: String,
    pub rows: usize,
    pub columns: Vec<String>,
    /// Raw row index the column names were taken from.
    pub header_row: usize,
    /// Present when the requested sheet was unusable and the first sheet was read instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_fallback: Option<String>,
}

/// A converted dataset and its report.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub dataset: DataSet,
    pub report: ConversionReport,
}

/// Convert the raw bytes of `source_key` (sheet `sheet_name`) into a normalized dataset.
///
/// Errors other than [`DatasetError::UnsupportedFormat`] surface as [`DatasetError::Conversion`]
/// carrying the cause.
pub fn convert_source(
    bytes: &[u8],
    source_key: &str,
    sheet_name: &str,
    options: &ConvertOptions,
) -> DatasetResult<Conversion> {
    let format = SourceFormat::detect(source_key)?;

    let parsed = match format.delimiter() {
        Some(delimiter) => read_delimited(
            bytes,
            &DelimitedOptions {
                delimiter,
                skip_rows: 0,
                infer_schema_rows: options.infer_schema_rows,
            },
        )
        .map(|dataset| Parsed {
            dataset,
            header_row: 0,
            sheet_fallback: None,
        }),
        None => read_spreadsheet(bytes, sheet_name, options),
    }
    .map_err(into_conversion_error)?;

    let Parsed {
        mut dataset,
        header_row,
        sheet_fallback,
    } = parsed;

    if let Some(note) = &sheet_fallback {
        tracing::warn!(source = source_key, sheet = sheet_name, note = %note, "sheet fallback");
    }

    normalize_column_names(&mut dataset);
    drop_empty_rows(&mut dataset);

    let report = ConversionReport {
        original_sheet: sheet_name.to_string(),
        processed_file: artifact_name(source_key, sheet_name),
        rows: dataset.row_count(),
        columns: dataset.schema.field_names().map(str::to_string).collect(),
        header_row,
        sheet_fallback,
    };
    tracing::info!(
        source = source_key,
        artifact = %report.processed_file,
        rows = report.rows,
        columns = report.columns.len(),
        header_row,
        "converted"
    );
    Ok(Conversion { dataset, report })
}

struct Parsed {
    dataset: DataSet,
    header_row: usize,
    sheet_fallback: Option<String>,
}

#[cfg(feature = "excel")]
fn read_spreadsheet(
    bytes: &[u8],
    sheet_name: &str,
    options: &ConvertOptions,
) -> DatasetResult<Parsed> {
    use super::csv::read_raw_rows;
    use super::excel::{SheetSelector, sheet_to_tsv};
    use super::header::detect_header_row;

    let text = sheet_to_tsv(
        bytes,
        &[SheetSelector::Name(sheet_name.to_string()), SheetSelector::Ordinal(0)],
    )?;

    let scan = options.header_scan_rows;
    let header_row = detect_header_row(read_raw_rows(&text.tsv, b'\t', scan), scan);
    tracing::debug!(sheet = %text.sheet, header_row, "header row detected");

    let dataset = read_delimited(
        &text.tsv,
        &DelimitedOptions {
            delimiter: b'\t',
            skip_rows: header_row,
            infer_schema_rows: 0,
        },
    )?;
    Ok(Parsed {
        dataset,
        header_row,
        sheet_fallback: text.fallback,
    })
}

#[cfg(not(feature = "excel"))]
fn read_spreadsheet(
    _bytes: &[u8],
    sheet_name: &str,
    _options: &ConvertOptions,
) -> DatasetResult<Parsed> {
    Err(DatasetError::conversion(format!(
        "cannot read sheet '{sheet_name}': excel support not enabled (enable cargo feature 'excel')"
    )))
}

fn into_conversion_error(err: DatasetError) -> DatasetError {
    match err {
        DatasetError::Conversion { .. } | DatasetError::UnsupportedFormat { .. } => err,
        other => DatasetError::conversion(other.to_string()),
    }
}

/// Trim names, name blank columns `column_{n}` (1-based) and suffix repeats with
/// `_duplicated_{k}` so every name is unique.
pub fn normalize_column_names(dataset: &mut DataSet) {
    let mut seen: HashSet<String> = HashSet::new();
    for (idx, field) in dataset.schema.fields.iter_mut().enumerate() {
        let trimmed = field.name.trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        let mut k = 0;
        while seen.contains(&name) {
            name = format!("{base}_duplicated_{k}");
            k += 1;
        }
        seen.insert(name.clone());
        field.name = name;
    }
}

/// Remove rows in which every cell is missing.
pub fn drop_empty_rows(dataset: &mut DataSet) {
    dataset.rows.retain(|row| row.iter().any(|v| !v.is_null()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Value};

    fn convert_csv(input: &str) -> Conversion {
        let opts = ConvertOptions::default();
        convert_source(input.as_bytes(), "uploads/sales.csv", "Sheet1", &opts).unwrap()
    }

    #[test]
    fn csv_report_describes_artifact() {
        let out = convert_csv("id,region,amount\n1,A,10\n2,B,5.5\n");
        assert_eq!(out.report.processed_file, "uploads_sales_Sheet1.parquet");
        assert_eq!(out.report.original_sheet, "Sheet1");
        assert_eq!(out.report.rows, 2);
        assert_eq!(out.report.columns, vec!["id", "region", "amount"]);
        assert_eq!(out.report.header_row, 0);
        assert_eq!(out.report.sheet_fallback, None);
        assert_eq!(out.dataset.schema.fields[0].data_type, DataType::Int64);
        assert_eq!(out.dataset.schema.fields[2].data_type, DataType::Float64);
    }

    #[test]
    fn names_are_trimmed_filled_and_deduplicated() {
        let out = convert_csv(" id ,,id,name, name ,\n1,2,3,4,5,6\n");
        assert_eq!(
            out.report.columns,
            vec!["id", "column_2", "id_duplicated_0", "name", "name_duplicated_0", "column_6"]
        );
    }

    #[test]
    fn repeated_duplicates_get_increasing_suffixes() {
        let out = convert_csv("a,a,a\n1,2,3\n");
        assert_eq!(out.report.columns, vec!["a", "a_duplicated_0", "a_duplicated_1"]);
    }

    #[test]
    fn all_missing_rows_are_dropped() {
        let out = convert_csv("a,b\n1,x\n,\nnull,N/A\n2,\n");
        assert_eq!(out.report.rows, 2);
        assert_eq!(out.dataset.rows[1], vec![Value::Int64(2), Value::Null]);
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let out =
            convert_source(b"a\tb\n1\t2\n", "t.TSV", "Sheet1", &ConvertOptions::default()).unwrap();
        assert_eq!(out.report.columns, vec!["a", "b"]);
        assert_eq!(out.report.processed_file, "t_Sheet1.parquet");
    }

    #[test]
    fn empty_input_is_conversion_error() {
        let err = convert_source(b"", "e.csv", "Sheet1", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Conversion { .. }));
    }

    #[test]
    fn unsupported_key_is_reported_as_such() {
        let err = convert_source(b"x", "e.pdf", "Sheet1", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat { .. }));
    }

    #[test]
    fn corrupt_workbook_is_conversion_error() {
        let err = convert_source(b"not a workbook", "b.xlsx", "Data", &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, DatasetError::Conversion { .. }));
    }

    #[test]
    fn conversion_is_deterministic() {
        let input = "k,v\n1,a\n2,b\n";
        let a = convert_csv(input);
        let b = convert_csv(input);
        assert_eq!(a.report, b.report);
        assert_eq!(a.dataset, b.dataset);
    }
}
