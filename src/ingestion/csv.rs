//! Tolerant delimited-text reader.
//!
//! Rules:
//!
//! - The first record (after `skip_rows`) is the header.
//! - Records that cannot be decoded are skipped; extra fields are truncated to the header width
//!   and short records are padded with missing values.
//! - [`MISSING_TOKENS`] become [`Value::Null`] in the same pass.
//! - Column kinds are inferred from the first `infer_schema_rows` data rows. Values outside the
//!   sample that do not parse under the inferred kind become [`Value::Null`].

use crate::error::{DatasetError, DatasetResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Literal tokens treated as missing values.
pub const MISSING_TOKENS: &[&str] = &["", "null", "NULL", "N/A"];

/// Default number of data rows sampled for schema inference.
pub const DEFAULT_INFER_SCHEMA_ROWS: usize = 10_000;

/// Options for [`read_delimited`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Records skipped before the header record.
    pub skip_rows: usize,
    /// Data rows sampled for inference. `0` disables inference: every column is [`DataType::Utf8`].
    pub infer_schema_rows: usize,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_rows: 0,
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
        }
    }
}

/// Read delimited text into a [`DataSet`] with inferred column kinds.
///
/// Header names are returned exactly as found (untrimmed); callers normalize them.
pub fn read_delimited(input: &[u8], options: &DelimitedOptions) -> DatasetResult<DataSet> {
    let mut records = raw_records(input, options.delimiter).skip(options.skip_rows);

    let header = records
        .next()
        .ok_or_else(|| DatasetError::conversion("no header row found (input is empty)"))?;
    let width = header.len();

    let rows: Vec<Vec<Option<String>>> = records
        .map(|mut record| {
            record.resize(width, String::new());
            record.into_iter().map(missing_to_none).collect()
        })
        .collect();

    let kinds: Vec<DataType> = (0..width)
        .map(|col| {
            if options.infer_schema_rows == 0 {
                DataType::Utf8
            } else {
                infer_kind(
                    rows.iter()
                        .take(options.infer_schema_rows)
                        .filter_map(|r| r[col].as_deref()),
                )
            }
        })
        .collect();

    let typed_rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(kinds.iter())
                .map(|(raw, kind)| match raw {
                    None => Value::Null,
                    Some(raw) => parse_as(kind, raw),
                })
                .collect()
        })
        .collect();

    let schema = Schema::new(
        header
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| Field::new(name, kind))
            .collect(),
    );
    Ok(DataSet::new(schema, typed_rows))
}

/// Read up to `limit` records as plain strings, no header assumed.
pub fn read_raw_rows(input: &[u8], delimiter: u8, limit: usize) -> Vec<Vec<String>> {
    raw_records(input, delimiter).take(limit).collect()
}

/// Iterate decodable records as owned strings, skipping malformed ones.
fn raw_records(input: &[u8], delimiter: u8) -> impl Iterator<Item = Vec<String>> + '_ {
    ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input)
        .into_byte_records()
        .enumerate()
        .filter_map(|(idx, res)| match res {
            Ok(record) => Some(
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .collect(),
            ),
            Err(e) => {
                tracing::debug!(record = idx, error = %e, "skipping malformed record");
                None
            }
        })
}

fn missing_to_none(raw: String) -> Option<String> {
    if MISSING_TOKENS.contains(&raw.as_str()) {
        None
    } else {
        Some(raw)
    }
}

fn infer_kind<'a>(sample: impl Iterator<Item = &'a str>) -> DataType {
    let mut saw_any = false;
    let (mut int_ok, mut float_ok, mut bool_ok) = (true, true, true);

    for raw in sample {
        saw_any = true;
        let t = raw.trim();
        int_ok = int_ok && t.parse::<i64>().is_ok();
        float_ok = float_ok && t.parse::<f64>().is_ok();
        bool_ok = bool_ok && parse_bool(t).is_some();
        if !(int_ok || float_ok || bool_ok) {
            break;
        }
    }

    match (saw_any, int_ok, float_ok, bool_ok) {
        (false, ..) => DataType::Utf8,
        (true, true, _, _) => DataType::Int64,
        (true, false, true, _) => DataType::Float64,
        (true, false, false, true) => DataType::Bool,
        _ => DataType::Utf8,
    }
}

fn parse_as(kind: &DataType, raw: String) -> Value {
    let t = raw.trim();
    match kind {
        DataType::Utf8 => Value::Utf8(raw),
        DataType::Int64 => t.parse::<i64>().map(Value::Int64).unwrap_or(Value::Null),
        DataType::Float64 => t.parse::<f64>().map(Value::Float64).unwrap_or(Value::Null),
        DataType::Bool => parse_bool(t).map(Value::Bool).unwrap_or(Value::Null),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> DataSet {
        read_delimited(input.as_bytes(), &DelimitedOptions::default()).unwrap()
    }

    #[test]
    fn infers_column_kinds() {
        let ds = read("id,name,score,active\n1,Ada,98.5,true\n2,Grace,87,FALSE\n");
        let kinds: Vec<DataType> = ds.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            kinds,
            vec![DataType::Int64, DataType::Utf8, DataType::Float64, DataType::Bool]
        );
        assert_eq!(
            ds.rows[1],
            vec![
                Value::Int64(2),
                Value::Utf8("Grace".to_string()),
                Value::Float64(87.0),
                Value::Bool(false),
            ]
        );
    }

    #[test]
    fn missing_tokens_become_null() {
        let ds = read("a,b,c,d\nnull,NULL,N/A,\nx,y,z,w\n");
        assert_eq!(ds.rows[0], vec![Value::Null; 4]);
        assert_eq!(ds.schema.fields[0].data_type, DataType::Utf8);
        // Lower-case "n/a" is not a missing token.
        let ds = read("a\nn/a\n");
        assert_eq!(ds.rows[0], vec![Value::Utf8("n/a".to_string())]);
    }

    #[test]
    fn ragged_rows_are_truncated_and_padded() {
        let ds = read("a,b\n1,2,3,4\n5\n");
        assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(ds.rows[1], vec![Value::Int64(5), Value::Null]);
    }

    #[test]
    fn values_outside_sample_that_fail_parse_become_null() {
        let opts = DelimitedOptions {
            infer_schema_rows: 2,
            ..Default::default()
        };
        let ds = read_delimited(b"n\n1\n2\nthree\n4\n", &opts).unwrap();
        assert_eq!(ds.schema.fields[0].data_type, DataType::Int64);
        assert_eq!(ds.rows[2], vec![Value::Null]);
        assert_eq!(ds.rows[3], vec![Value::Int64(4)]);
    }

    #[test]
    fn zero_inference_reads_everything_as_text() {
        let opts = DelimitedOptions {
            delimiter: b'\t',
            skip_rows: 1,
            infer_schema_rows: 0,
        };
        let ds = read_delimited(b"title\t\nid\tqty\n1\t2\n", &opts).unwrap();
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["id", "qty"]);
        assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
        assert_eq!(ds.rows[0][1], Value::Utf8("2".to_string()));
    }

    #[test]
    fn column_with_only_missing_values_is_text() {
        let ds = read("a,b\n1,\n2,\n");
        assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let ds = read_delimited(b"name\nab\xffc\n", &DelimitedOptions::default()).unwrap();
        assert_eq!(ds.row_count(), 1);
        assert!(matches!(&ds.rows[0][0], Value::Utf8(s) if s.starts_with("ab")));
    }

    #[test]
    fn empty_input_is_conversion_error() {
        let err = read_delimited(b"", &DelimitedOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Conversion { .. }));
    }

    #[test]
    fn raw_rows_respect_limit() {
        let rows = read_raw_rows(b"a\tb\n1\t2\n3\t4\n", b'\t', 2);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }
}
