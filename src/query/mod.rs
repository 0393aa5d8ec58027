//! Read-side operations over a loaded artifact.
//!
//! - [`view`]: filter, smart-sort and paginate rows for browsing
//! - [`aggregate`]: single-level group-by with capped, chart-friendly output
//! - [`unique`]: distinct values of one column for filter dropdowns
//!
//! Every operation works on its own copy of the data; nothing here touches storage.

pub mod aggregate;
pub mod unique;
pub mod view;

use serde_json::Value as JsonValue;

use crate::types::Value;

pub use aggregate::{AggregateRequest, Aggregation, aggregate};
pub use unique::unique_values;
pub use view::{Page, ViewRequest, view};

/// Render a cell as its native JSON value. Missing values and non-finite floats become `null`.
pub fn to_json(v: &Value) -> JsonValue {
    match v {
        Value::Null => JsonValue::Null,
        Value::Int64(x) => JsonValue::from(*x),
        Value::Float64(x) => serde_json::Number::from_f64(*x)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Utf8(s) => JsonValue::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rendering_is_native() {
        assert_eq!(to_json(&Value::Int64(7)), serde_json::json!(7));
        assert_eq!(to_json(&Value::Float64(15.0)).to_string(), "15.0");
        assert_eq!(to_json(&Value::Float64(f64::NAN)), JsonValue::Null);
        assert_eq!(to_json(&Value::Null), JsonValue::Null);
        assert_eq!(to_json(&Value::Utf8("a".into())), serde_json::json!("a"));
    }
}
