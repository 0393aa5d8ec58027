//! Distinct values of a single column.

use std::collections::BTreeSet;

use crate::types::Value;

/// Default maximum number of distinct values returned.
pub const DEFAULT_UNIQUE_CAP: usize = 100;

/// Render to text, drop missing, dedup, sort ascending, keep the first `cap`, then drop entries
/// that are blank after trimming.
///
/// Blank entries are removed after the cap, so fewer than `cap` values may come back even when
/// more distinct values exist.
pub fn unique_values(values: impl IntoIterator<Item = Value>, cap: usize) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| v.to_text())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .take(cap)
        .filter(|s| !s.trim().is_empty())
        .collect()
}
