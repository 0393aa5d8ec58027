//! Header-row detection for noisy spreadsheet exports.
//!
//! Spreadsheet exports often start with title banners, notes and blank lines. The header is the
//! first row that looks "full": more than 5 non-empty cells, or more than half of its cells
//! non-empty. A cell is non-empty when, after trimming, it is neither `""` nor the literal `null`.

/// Default number of rows inspected before giving up and assuming row 0.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 1_000;

const MIN_HEADER_CELLS: usize = 5;

/// Count cells that carry content.
pub fn non_empty_cells<S: AsRef<str>>(cells: &[S]) -> usize {
    cells
        .iter()
        .filter(|c| {
            let t = c.as_ref().trim();
            !t.is_empty() && t != "null"
        })
        .count()
}

/// Returns `true` if `cells` qualifies as a header row.
pub fn is_header_candidate<S: AsRef<str>>(cells: &[S]) -> bool {
    let filled = non_empty_cells(cells);
    filled > MIN_HEADER_CELLS || (!cells.is_empty() && filled * 2 > cells.len())
}

/// Index of the first header-like row within the first `scan_limit` rows, or 0.
pub fn detect_header_row<I, S>(rows: I, scan_limit: usize) -> usize
where
    I: IntoIterator<Item = Vec<S>>,
    S: AsRef<str>,
{
    rows.into_iter()
        .take(scan_limit)
        .position(|row| is_header_candidate(&row))
        .unwrap_or(0)
}
