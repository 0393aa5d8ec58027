//! Columnar artifact codec.
//!
//! An artifact is a single Parquet object with one row group. Every column is `OPTIONAL`, so
//! missing cells survive the round trip, and the declared kind is carried by the physical type:
//!
//! | kind      | physical type        |
//! |-----------|----------------------|
//! | `Int64`   | `INT64`              |
//! | `Float64` | `DOUBLE`             |
//! | `Bool`    | `BOOLEAN`            |
//! | `Utf8`    | `BYTE_ARRAY (UTF8)`  |
//!
//! Readers take the schema from the file footer and never re-infer.

use std::sync::Arc;

use bytes::Bytes;
use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{ChunkReader, FileReader};
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::file::writer::SerializedFileWriter;
use parquet::record::Field as RecordField;
use parquet::schema::types::{ColumnDescriptor, Type};

use crate::error::{DatasetError, DatasetResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Encode a dataset as Parquet bytes.
pub fn write_artifact(dataset: &DataSet) -> DatasetResult<Vec<u8>> {
    let schema = Arc::new(parquet_schema(&dataset.schema)?);
    let props = Arc::new(WriterProperties::builder().build());

    let mut buf: Vec<u8> = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buf, schema, props)?;
    let mut rg = writer.next_row_group()?;
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column()? {
        let kind = dataset
            .schema
            .fields
            .get(col_idx)
            .map(|f| f.data_type)
            .ok_or_else(|| {
                DatasetError::conversion("parquet writer yielded more columns than the schema")
            })?;
        write_column(col.untyped(), kind, dataset.column(col_idx))?;
        col.close()?;
        col_idx += 1;
    }
    rg.close()?;
    writer.close()?;
    Ok(buf)
}

/// Decode a whole artifact.
pub fn read_artifact(bytes: Vec<u8>) -> DatasetResult<DataSet> {
    let reader = SerializedFileReader::new(Bytes::from(bytes))?;
    let schema = artifact_schema(&reader)?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row in reader.get_row_iter(None)? {
        let row = row?;
        rows.push(row.get_column_iter().map(|(_, f)| value_from_field(f)).collect());
    }
    Ok(DataSet::new(schema, rows))
}

/// Decode a single column, reading only that column's chunks.
pub fn read_column(bytes: Vec<u8>, column: &str) -> DatasetResult<(Field, Vec<Value>)> {
    let reader = SerializedFileReader::new(Bytes::from(bytes))?;
    let descr = reader.metadata().file_metadata().schema_descr_ptr();
    let col = descr
        .columns()
        .iter()
        .find(|c| c.name() == column)
        .ok_or_else(|| DatasetError::column_not_found(column))?;
    let field = Field::new(column, kind_of(col)?);

    let projection = Type::group_type_builder(descr.root_schema().name())
        .with_fields(vec![col.self_type_ptr()])
        .build()?;

    let mut values = Vec::new();
    for row in reader.get_row_iter(Some(projection))? {
        let row = row?;
        values.push(
            row.get_column_iter()
                .next()
                .map(|(_, f)| value_from_field(f))
                .unwrap_or(Value::Null),
        );
    }
    Ok((field, values))
}

fn parquet_schema(schema: &Schema) -> DatasetResult<Type> {
    let fields = schema
        .fields
        .iter()
        .map(|f| {
            let (physical, converted) = match f.data_type {
                DataType::Int64 => (PhysicalType::INT64, ConvertedType::NONE),
                DataType::Float64 => (PhysicalType::DOUBLE, ConvertedType::NONE),
                DataType::Bool => (PhysicalType::BOOLEAN, ConvertedType::NONE),
                DataType::Utf8 => (PhysicalType::BYTE_ARRAY, ConvertedType::UTF8),
            };
            Type::primitive_type_builder(&f.name, physical)
                .with_repetition(Repetition::OPTIONAL)
                .with_converted_type(converted)
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Type::group_type_builder("schema").with_fields(fields).build()?)
}

fn write_column<'a>(
    writer: &mut ColumnWriter<'_>,
    kind: DataType,
    values: impl Iterator<Item = &'a Value>,
) -> DatasetResult<()> {
    match (kind, writer) {
        (DataType::Int64, ColumnWriter::Int64ColumnWriter(w)) => {
            let (vals, defs) = levels(values, |v| match v {
                Value::Int64(x) => Some(*x),
                _ => None,
            });
            w.write_batch(&vals, Some(&defs), None)?;
        }
        (DataType::Float64, ColumnWriter::DoubleColumnWriter(w)) => {
            let (vals, defs) = levels(values, |v| match v {
                Value::Float64(x) => Some(*x),
                _ => None,
            });
            w.write_batch(&vals, Some(&defs), None)?;
        }
        (DataType::Bool, ColumnWriter::BoolColumnWriter(w)) => {
            let (vals, defs) = levels(values, |v| match v {
                Value::Bool(x) => Some(*x),
                _ => None,
            });
            w.write_batch(&vals, Some(&defs), None)?;
        }
        (DataType::Utf8, ColumnWriter::ByteArrayColumnWriter(w)) => {
            let (vals, defs) = levels(values, |v| match v {
                Value::Utf8(s) => Some(ByteArray::from(s.as_bytes().to_vec())),
                _ => None,
            });
            w.write_batch(&vals, Some(&defs), None)?;
        }
        (kind, _) => {
            return Err(DatasetError::conversion(format!(
                "no parquet column writer for {kind} column"
            )));
        }
    }
    Ok(())
}

/// Split optional cells into dense values plus definition levels (1 = present, 0 = missing).
fn levels<'a, T>(
    values: impl Iterator<Item = &'a Value>,
    pick: impl Fn(&Value) -> Option<T>,
) -> (Vec<T>, Vec<i16>) {
    let mut vals = Vec::new();
    let mut defs = Vec::new();
    for v in values {
        match pick(v) {
            Some(x) => {
                vals.push(x);
                defs.push(1);
            }
            None => defs.push(0),
        }
    }
    (vals, defs)
}

fn artifact_schema<R: ChunkReader + 'static>(
    reader: &SerializedFileReader<R>,
) -> DatasetResult<Schema> {
    let fields = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| Ok(Field::new(c.name(), kind_of(c)?)))
        .collect::<DatasetResult<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

fn kind_of(col: &ColumnDescriptor) -> DatasetResult<DataType> {
    match col.physical_type() {
        PhysicalType::INT32 | PhysicalType::INT64 => Ok(DataType::Int64),
        PhysicalType::FLOAT | PhysicalType::DOUBLE => Ok(DataType::Float64),
        PhysicalType::BOOLEAN => Ok(DataType::Bool),
        PhysicalType::BYTE_ARRAY | PhysicalType::FIXED_LEN_BYTE_ARRAY => Ok(DataType::Utf8),
        other => Err(DatasetError::conversion(format!(
            "column '{}' has unsupported physical type {other}",
            col.name()
        ))),
    }
}

fn value_from_field(f: &RecordField) -> Value {
    match f {
        RecordField::Null => Value::Null,
        RecordField::Bool(b) => Value::Bool(*b),
        RecordField::Byte(v) => Value::Int64(i64::from(*v)),
        RecordField::Short(v) => Value::Int64(i64::from(*v)),
        RecordField::Int(v) => Value::Int64(i64::from(*v)),
        RecordField::Long(v) => Value::Int64(*v),
        RecordField::UByte(v) => Value::Int64(i64::from(*v)),
        RecordField::UShort(v) => Value::Int64(i64::from(*v)),
        RecordField::UInt(v) => Value::Int64(i64::from(*v)),
        RecordField::ULong(v) => i64::try_from(*v).map(Value::Int64).unwrap_or(Value::Null),
        RecordField::Float(v) => Value::Float64(f64::from(*v)),
        RecordField::Double(v) => Value::Float64(*v),
        RecordField::Str(s) => Value::Utf8(s.clone()),
        RecordField::Bytes(b) => Value::Utf8(String::from_utf8_lossy(b.data()).into_owned()),
        other => Value::Utf8(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("region name", DataType::Utf8),
            Field::new("score", DataType::Float64),
            Field::new("active", DataType::Bool),
        ]);
        let rows = vec![
            vec![
                Value::Int64(9_007_199_254_740_993),
                Value::Utf8("north".to_string()),
                Value::Float64(1.5),
                Value::Bool(true),
            ],
            vec![Value::Null, Value::Null, Value::Null, Value::Null],
            vec![
                Value::Int64(-4),
                Value::Utf8(String::new()),
                Value::Float64(f64::NAN),
                Value::Bool(false),
            ],
        ];
        DataSet::new(schema, rows)
    }

    #[test]
    fn schema_and_missing_cells_survive() {
        let ds = sample();
        let back = read_artifact(write_artifact(&ds).unwrap()).unwrap();
        assert_eq!(back.schema, ds.schema);
        assert_eq!(back.rows[0], ds.rows[0]);
        assert_eq!(back.rows[1], vec![Value::Null; 4]);
        assert_eq!(back.rows[2][1], Value::Utf8(String::new()));
        assert!(matches!(back.rows[2][2], Value::Float64(v) if v.is_nan()));
    }

    #[test]
    fn empty_dataset_keeps_schema() {
        let ds = DataSet::new(Schema::new(vec![Field::new("a", DataType::Utf8)]), Vec::new());
        let back = read_artifact(write_artifact(&ds).unwrap()).unwrap();
        assert_eq!(back.schema, ds.schema);
        assert_eq!(back.row_count(), 0);
    }

    #[test]
    fn projection_reads_one_column() {
        let bytes = write_artifact(&sample()).unwrap();
        let (field, values) = read_column(bytes, "region name").unwrap();
        assert_eq!(field, Field::new("region name", DataType::Utf8));
        assert_eq!(
            values,
            vec![Value::Utf8("north".to_string()), Value::Null, Value::Utf8(String::new())]
        );
    }

    #[test]
    fn projection_of_unknown_column_fails() {
        let bytes = write_artifact(&sample()).unwrap();
        let err = read_column(bytes, "nope").unwrap_err();
        assert!(matches!(err, DatasetError::ColumnNotFound { .. }));
    }

    #[test]
    fn garbage_bytes_are_parquet_errors() {
        let err = read_artifact(b"not parquet".to_vec()).unwrap_err();
        assert!(matches!(err, DatasetError::Parquet(_)));
    }
}
