//! Smart sort: numeric when the column coerces, lexical otherwise.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::coerce::to_f64_lenient;
use crate::types::{DataSet, Value};

/// Sort column plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, descending: bool) -> Self {
        Self {
            column: column.into(),
            descending,
        }
    }
}

/// Sort rows in place (stable).
///
/// Values are keyed by their numeric view; values without one sort last in either direction.
/// When no present value has a numeric view, rows are ordered by their text instead. Unknown
/// columns leave the dataset untouched.
pub fn smart_sort(dataset: &mut DataSet, spec: &SortSpec) {
    let Some(idx) = dataset.schema.index_of(&spec.column) else {
        return;
    };

    let numeric: Vec<Option<f64>> = dataset.column(idx).map(to_f64_lenient).collect();
    let any_present = dataset.column(idx).any(|v| !v.is_null());
    let any_numeric = numeric.iter().any(Option::is_some);

    let keys: Vec<SortKey> = if any_numeric || !any_present {
        numeric.into_iter().map(SortKey::Number).collect()
    } else {
        tracing::debug!(column = %spec.column, "no numeric values, sorting lexically");
        dataset
            .column(idx)
            .map(|v| SortKey::Text(v.to_text()))
            .collect()
    };

    let mut order: Vec<usize> = (0..dataset.rows.len()).collect();
    order.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], spec.descending));

    let mut rows: Vec<Option<Vec<Value>>> = std::mem::take(&mut dataset.rows)
        .into_iter()
        .map(Some)
        .collect();
    dataset.rows = order.into_iter().filter_map(|i| rows[i].take()).collect();
}

enum SortKey {
    Number(Option<f64>),
    Text(Option<String>),
}

fn compare_keys(a: &SortKey, b: &SortKey, descending: bool) -> Ordering {
    match (a, b) {
        (SortKey::Number(a), SortKey::Number(b)) => {
            nulls_last(a.as_ref(), b.as_ref(), descending, |x, y| x.total_cmp(y))
        }
        (SortKey::Text(a), SortKey::Text(b)) => {
            nulls_last(a.as_ref(), b.as_ref(), descending, |x, y| x.cmp(y))
        }
        _ => Ordering::Equal,
    }
}

fn nulls_last<T>(
    a: Option<&T>,
    b: Option<&T>,
    descending: bool,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = cmp(x, y);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
