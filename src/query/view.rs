//! Paginated browsing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::to_json;
use crate::error::{DatasetError, DatasetResult};
use crate::processing::{FilterSpec, SortSpec, apply_filters, smart_sort};
use crate::types::{DataSet, Value};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Options for [`view`].
///
/// Use [`Default`] for the first page of an unsorted, unfiltered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    /// 1-based page number. Values below 1 are treated as 1.
    pub page: i64,
    /// Rows per page; must be greater than 0.
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filters: FilterSpec,
}

impl Default for ViewRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            filters: FilterSpec::new(),
        }
    }
}

/// One page of rows plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Rows as ordered column → cell maps.
    pub data: Vec<Map<String, JsonValue>>,
    /// Rows remaining after filtering.
    pub total_rows: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub columns: Vec<String>,
    /// Column → declared kind label.
    pub dtypes: Map<String, JsonValue>,
}

/// Filter, sort and paginate `dataset`.
///
/// `total_pages` is `total_rows / page_size + 1`, so an exact multiple reports one trailing empty
/// page. Pages past the end yield no rows. 64-bit integer cells are rendered as strings; missing
/// and NaN cells as `""`.
pub fn view(dataset: DataSet, request: &ViewRequest) -> DatasetResult<Page> {
    if request.page_size == 0 {
        return Err(DatasetError::invalid("page_size must be greater than 0"));
    }
    let page = usize::try_from(request.page.max(1)).unwrap_or(1);

    let mut ds = apply_filters(&dataset, &request.filters);
    drop(dataset);

    let columns: Vec<String> = ds.schema.field_names().map(str::to_string).collect();
    let dtypes: Map<String, JsonValue> = ds
        .schema
        .fields
        .iter()
        .map(|f| (f.name.clone(), JsonValue::from(f.data_type.label())))
        .collect();

    let total_rows = ds.row_count();
    if total_rows == 0 {
        return Ok(Page {
            data: Vec::new(),
            total_rows: 0,
            total_pages: 0,
            current_page: 1,
            columns,
            dtypes,
        });
    }

    if let Some(sort) = &request.sort {
        smart_sort(&mut ds, sort);
    }

    let total_pages = total_rows / request.page_size + 1;
    let offset = (page - 1).saturating_mul(request.page_size);

    let data = ds
        .rows
        .iter()
        .skip(offset)
        .take(request.page_size)
        .map(|row| {
            ds.schema
                .fields
                .iter()
                .enumerate()
                .map(|(idx, field)| {
                    let cell = row.get(idx).unwrap_or(&Value::Null);
                    (field.name.clone(), render_cell(field.data_type.is_wide_integer(), cell))
                })
                .collect()
        })
        .collect();

    Ok(Page {
        data,
        total_rows,
        total_pages,
        current_page: page,
        columns,
        dtypes,
    })
}

fn render_cell(as_text: bool, cell: &Value) -> JsonValue {
    match cell {
        Value::Null => JsonValue::from(""),
        Value::Int64(x) if as_text => JsonValue::from(x.to_string()),
        other => match to_json(other) {
            JsonValue::Null => JsonValue::from(""),
            v => v,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};

    fn numbered(n: i64) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("score", DataType::Float64),
        ]);
        let rows = (0..n)
            .map(|i| vec![Value::Int64(i), Value::Float64(i as f64 / 2.0)])
            .collect();
        DataSet::new(schema, rows)
    }

    fn request(page: i64, page_size: usize) -> ViewRequest {
        ViewRequest {
            page,
            page_size,
            ..Default::default()
        }
    }

    #[test]
    fn pages_slice_rows() {
        let page = view(numbered(25), &request(3, 10)).unwrap();
        assert_eq!(page.total_rows, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0]["id"], JsonValue::from("20"));
    }

    #[test]
    fn exact_multiple_reports_trailing_page() {
        let page = view(numbered(20), &request(1, 10)).unwrap();
        assert_eq!(page.total_pages, 3);
        let last = view(numbered(20), &request(3, 10)).unwrap();
        assert!(last.data.is_empty());
    }

    #[test]
    fn page_below_one_is_clamped() {
        let page = view(numbered(3), &request(-4, 2)).unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn page_past_end_is_empty() {
        let page = view(numbered(3), &request(99, 2)).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_rows, 3);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = view(numbered(3), &request(1, 0)).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidArgument { .. }));
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let mut req = request(5, 10);
        req.filters.insert("id".into(), "nothing-matches".into());
        let page = view(numbered(3), &req).unwrap();
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.columns, vec!["id", "score"]);
    }

    #[test]
    fn cells_render_safely() {
        let schema = Schema::new(vec![
            Field::new("big", DataType::Int64),
            Field::new("x", DataType::Float64),
            Field::new("s", DataType::Utf8),
        ]);
        let rows = vec![vec![
            Value::Int64(9_007_199_254_740_993),
            Value::Float64(f64::NAN),
            Value::Null,
        ]];
        let page = view(DataSet::new(schema, rows), &ViewRequest::default()).unwrap();
        let row = &page.data[0];
        assert_eq!(row["big"], JsonValue::from("9007199254740993"));
        assert_eq!(row["x"], JsonValue::from(""));
        assert_eq!(row["s"], JsonValue::from(""));
        assert_eq!(page.dtypes["big"], JsonValue::from("Int64"));
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, vec!["big", "x", "s"]);
    }

    #[test]
    fn sorts_before_paginating() {
        let mut req = request(1, 2);
        req.sort = Some(SortSpec::new("score", true));
        let page = view(numbered(5), &req).unwrap();
        assert_eq!(page.data[0]["id"], JsonValue::from("4"));
        assert_eq!(page.data[1]["id"], JsonValue::from("3"));
    }
}
