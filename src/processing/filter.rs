//! Substring filtering for [`crate::types::DataSet`].

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::types::{DataSet, Value};

/// Column name → substring pattern.
///
/// Matching is case-insensitive. Entries with an empty pattern or a column missing from the
/// schema are ignored.
pub type FilterSpec = BTreeMap<String, String>;

/// Returns a new [`DataSet`] with only the rows matching every active entry of `filters`.
///
/// Rows are evaluated in parallel; output keeps input order. Missing cells never match.
pub fn apply_filters(dataset: &DataSet, filters: &FilterSpec) -> DataSet {
    let active: Vec<(usize, String)> = filters
        .iter()
        .filter(|(_, pattern)| !pattern.is_empty())
        .filter_map(|(column, pattern)| {
            dataset
                .schema
                .index_of(column)
                .map(|idx| (idx, pattern.to_lowercase()))
        })
        .collect();

    if active.is_empty() {
        return dataset.clone();
    }

    let rows = dataset
        .rows
        .par_iter()
        .filter(|row| {
            active.iter().all(|(idx, needle)| {
                row.get(*idx)
                    .and_then(Value::to_text)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            })
        })
        .cloned()
        .collect();

    DataSet::new(dataset.schema.clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("status", DataType::Utf8),
        ]);
        let rows = vec![
            vec![Value::Int64(1), Value::Utf8("OK".to_string())],
            vec![Value::Int64(2), Value::Utf8("fail".to_string())],
            vec![Value::Int64(13), Value::Null],
            vec![Value::Int64(31), Value::Utf8("Okay".to_string())],
        ];
        DataSet::new(schema, rows)
    }

    fn spec(entries: &[(&str, &str)]) -> FilterSpec {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn matches_case_insensitively_in_order() {
        let out = apply_filters(&sample_dataset(), &spec(&[("status", "ok")]));
        let ids: Vec<Value> = out.column(0).cloned().collect();
        assert_eq!(ids, vec![Value::Int64(1), Value::Int64(31)]);
    }

    #[test]
    fn numbers_match_on_their_text() {
        let out = apply_filters(&sample_dataset(), &spec(&[("id", "3")]));
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn all_entries_must_match() {
        let out = apply_filters(&sample_dataset(), &spec(&[("id", "1"), ("status", "OK")]));
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn unknown_columns_and_empty_patterns_are_ignored() {
        let ds = sample_dataset();
        let out = apply_filters(&ds, &spec(&[("nope", "x"), ("status", "")]));
        assert_eq!(out, ds);
    }

    #[test]
    fn missing_cells_never_match() {
        let out = apply_filters(&sample_dataset(), &spec(&[("status", "a")]));
        let ids: Vec<Value> = out.column(0).cloned().collect();
        assert_eq!(ids, vec![Value::Int64(2), Value::Int64(31)]);
    }
}
