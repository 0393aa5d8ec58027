//! Single-level group-by aggregation.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::to_json;
use crate::error::{DatasetError, DatasetResult};
use crate::processing::coerce::to_f64_numeric;
use crate::processing::reduce::compare_same_kind;
use crate::processing::{ReduceOp, reduce_values, round2};
use crate::types::{DataSet, DataType, Value};

/// Default maximum number of groups returned.
pub const DEFAULT_GROUP_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub group_by: String,
    /// One of `sum`, `avg`, `count`, `min`, `max` (case-insensitive).
    pub operation: String,
    pub target: String,
}

impl AggregateRequest {
    pub fn new(
        group_by: impl Into<String>,
        operation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            group_by: group_by.into(),
            operation: operation.into(),
            target: target.into(),
        }
    }
}

/// Chart-ready aggregation output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    /// One `{x_key: group, y_key: metric}` map per group, largest metric first.
    pub data: Vec<Map<String, JsonValue>>,
    pub x_key: String,
    /// Metric column name, `{operation}_{target}`.
    pub y_key: String,
    pub columns: Vec<String>,
}

/// Group `dataset` by one column and reduce another.
///
/// For `sum`/`avg`, target cells without a numeric view are dropped before grouping, so a group
/// whose every target cell fails coercion does not appear. Groups are sorted by metric
/// (descending, stable, missing last), truncated to `group_cap`, and `sum`/`avg` metrics are
/// rounded to two decimal places.
pub fn aggregate(
    dataset: &DataSet,
    request: &AggregateRequest,
    group_cap: usize,
) -> DatasetResult<Aggregation> {
    let group_idx = dataset
        .schema
        .index_of(&request.group_by)
        .ok_or_else(|| DatasetError::column_not_found(&request.group_by))?;
    let op: ReduceOp = request.operation.parse()?;
    let target_idx = dataset
        .schema
        .index_of(&request.target)
        .ok_or_else(|| DatasetError::column_not_found(&request.target))?;
    let target_kind = dataset.schema.fields[target_idx].data_type;

    if op.is_arithmetic() && target_kind == DataType::Bool {
        return Err(DatasetError::SchemaCoercion {
            column: request.target.clone(),
        });
    }

    let y_key = format!("{op}_{}", request.target);

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(&Value, Vec<&Value>)> = Vec::new();
    for row in &dataset.rows {
        let key = row.get(group_idx).unwrap_or(&Value::Null);
        let target = row.get(target_idx).unwrap_or(&Value::Null);
        if op.is_arithmetic() && to_f64_numeric(target).is_none() {
            continue;
        }
        let slot = *index.entry(GroupKey::from(key)).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(target);
    }

    let metric_kind = match op {
        ReduceOp::Sum | ReduceOp::Avg => DataType::Float64,
        ReduceOp::Count => DataType::Int64,
        ReduceOp::Min | ReduceOp::Max => target_kind,
    };
    let mut reduced: Vec<(&Value, Value)> = groups
        .into_iter()
        .map(|(key, values)| (key, reduce_values(op, target_kind, values)))
        .collect();
    reduced.sort_by(|(_, a), (_, b)| metric_desc(metric_kind, a, b));
    reduced.truncate(group_cap);

    let data = reduced
        .into_iter()
        .map(|(key, metric)| {
            let metric = match metric {
                Value::Float64(x) if op.is_arithmetic() => Value::Float64(round2(x)),
                other => other,
            };
            let mut out = Map::new();
            out.insert(request.group_by.clone(), to_json(key));
            out.insert(y_key.clone(), to_json(&metric));
            out
        })
        .collect();

    tracing::debug!(group_by = %request.group_by, y_key = %y_key, "aggregated");
    Ok(Aggregation {
        data,
        x_key: request.group_by.clone(),
        columns: vec![request.group_by.clone(), y_key.clone()],
        y_key,
    })
}

fn metric_desc(kind: DataType, a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_same_kind(kind, b, a),
    }
}

/// Hashable identity of a group-by cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
}

impl From<&Value> for GroupKey {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Int64(x) => Self::Int(*x),
            // -0.0 and 0.0 share a group; all NaNs share a group.
            Value::Float64(x) if *x == 0.0 => Self::Float(0.0_f64.to_bits()),
            Value::Float64(x) if x.is_nan() => Self::Float(f64::NAN.to_bits()),
            Value::Float64(x) => Self::Float(x.to_bits()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Utf8(s) => Self::Text(s.clone()),
        }
    }
}
