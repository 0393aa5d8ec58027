//! Group reductions used by aggregation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::coerce::to_f64_numeric;
use crate::error::DatasetError;
use crate::types::{DataType, Value};

/// Built-in reduction operations over a target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    /// Sum of numeric values.
    Sum,
    /// Mean of numeric values.
    Avg,
    /// Number of non-missing values.
    Count,
    /// Smallest value under the column's declared kind.
    Min,
    /// Largest value under the column's declared kind.
    Max,
}

impl ReduceOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// `sum` and `avg` coerce the target to numbers and drop rows that do not coerce.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Sum | Self::Avg)
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReduceOp {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "avg" => Ok(Self::Avg),
            "count" => Ok(Self::Count),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(DatasetError::invalid("Invalid operation")),
        }
    }
}

/// Reduce the target values of one group.
///
/// `kind` is the target column's declared kind. For arithmetic operations, values without a
/// numeric view are skipped (callers normally drop those rows first). Returns [`Value::Null`]
/// when there is nothing to reduce.
pub fn reduce_values<'a>(
    op: ReduceOp,
    kind: DataType,
    values: impl IntoIterator<Item = &'a Value>,
) -> Value {
    let present = values.into_iter().filter(|v| !v.is_null());
    match op {
        ReduceOp::Count => Value::Int64(present.count() as i64),
        ReduceOp::Sum | ReduceOp::Avg => {
            let (sum, n) = present
                .filter_map(to_f64_numeric)
                .fold((0.0_f64, 0_usize), |(s, n), x| (s + x, n + 1));
            match (op, n) {
                (_, 0) => Value::Null,
                (ReduceOp::Avg, n) => Value::Float64(sum / n as f64),
                _ => Value::Float64(sum),
            }
        }
        ReduceOp::Min | ReduceOp::Max => {
            let pick = |acc: Option<&'a Value>, v: &'a Value| match acc {
                None => Some(v),
                Some(cur) => {
                    let ord = compare_same_kind(kind, v, cur);
                    let better = if op == ReduceOp::Min {
                        ord == Ordering::Less
                    } else {
                        ord == Ordering::Greater
                    };
                    Some(if better { v } else { cur })
                }
            };
            present
                .filter(|v| !matches!(v, Value::Float64(x) if x.is_nan()))
                .fold(None, pick)
                .cloned()
                .unwrap_or(Value::Null)
        }
    }
}

/// Order two non-missing values of the same declared kind.
pub fn compare_same_kind(kind: DataType, a: &Value, b: &Value) -> Ordering {
    match (kind, a, b) {
        (DataType::Int64, Value::Int64(x), Value::Int64(y)) => x.cmp(y),
        (DataType::Float64, Value::Float64(x), Value::Float64(y)) => x.total_cmp(y),
        (DataType::Bool, Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (DataType::Utf8, Value::Utf8(x), Value::Utf8(y)) => x.cmp(y),
        _ => a.to_text().cmp(&b.to_text()),
    }
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
