//! Best-effort numeric coercion.
//!
//! Two flavours: [`to_f64_lenient`] is used for ordering and also maps booleans to `1`/`0`;
//! [`to_f64_numeric`] is used for arithmetic and refuses booleans. Text is parsed after trimming
//! in both; NaN parses are treated as non-numeric.

use crate::types::Value;

/// Numeric view of a value for sorting. Booleans count as `1.0`/`0.0`.
pub fn to_f64_lenient(v: &Value) -> Option<f64> {
    match v {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => to_f64_numeric(other),
    }
}

/// Numeric view of a value for arithmetic. Booleans and missing values have none.
pub fn to_f64_numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Int64(x) => *x as f64,
        Value::Float64(x) => *x,
        Value::Utf8(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(_) | Value::Null => return None,
    };
    (!n.is_nan()).then_some(n)
}
