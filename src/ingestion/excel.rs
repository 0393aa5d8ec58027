#![cfg(feature = "excel")]

//! Spreadsheet access: sheet listing and tab-delimited re-encoding.
//!
//! Nothing here materializes typed rows. A sheet is streamed row by row into an intermediate
//! tab-delimited buffer, which the converter then reads with the delimited-text reader.

use std::fmt;
use std::io::Cursor;

use calamine::{Data, Ods, Range, Reader, Xls, Xlsb, Xlsx, open_workbook_auto_from_rs};

use crate::error::{DatasetError, DatasetResult};

type Workbook = calamine::Sheets<Cursor<Vec<u8>>>;

/// Rendering of date/time cells.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One way of listing sheet names. Strategies are tried in order; first success wins.
pub trait SheetLister: Send + Sync {
    /// Engine label reported in scan results.
    fn engine(&self) -> &'static str;

    /// List sheet names without reading row data.
    fn list(&self, source_key: &str, bytes: &[u8]) -> Result<Vec<String>, String>;
}

/// Sniffs the container format and lists sheet names from workbook metadata.
#[derive(Debug, Default)]
pub struct AutoLister;

impl SheetLister for AutoLister {
    fn engine(&self) -> &'static str {
        "calamine-auto"
    }

    fn list(&self, _source_key: &str, bytes: &[u8]) -> Result<Vec<String>, String> {
        open_workbook(bytes)
            .map(|wb| wb.sheet_names())
            .map_err(|e| e.to_string())
    }
}

/// Tries every concrete workbook reader in turn, regardless of what the container looks like.
#[derive(Debug, Default)]
pub struct ProbeLister;

impl SheetLister for ProbeLister {
    fn engine(&self) -> &'static str {
        "calamine-probe"
    }

    fn list(&self, _source_key: &str, bytes: &[u8]) -> Result<Vec<String>, String> {
        open_with::<Xlsx<_>>(bytes)
            .or_else(|_| open_with::<Xlsb<_>>(bytes))
            .or_else(|_| open_with::<Xls<_>>(bytes))
            .or_else(|_| open_with::<Ods<_>>(bytes))
    }
}

fn open_with<R>(bytes: &[u8]) -> Result<Vec<String>, String>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: fmt::Display,
{
    R::new(Cursor::new(bytes.to_vec()))
        .map(|wb| wb.sheet_names())
        .map_err(|e| e.to_string())
}

fn open_workbook(bytes: &[u8]) -> Result<Workbook, calamine::Error> {
    open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
}

/// How a sheet is located inside a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Exact sheet name.
    Name(String),
    /// Zero-based position in workbook order.
    Ordinal(usize),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Ordinal(idx) => write!(f, "#{idx}"),
        }
    }
}

/// A sheet re-encoded as tab-delimited text.
#[derive(Debug, Clone)]
pub struct SheetText {
    /// Name of the sheet that was actually read.
    pub sheet: String,
    /// Tab-delimited rows, one per sheet row starting at row 0; blank rows are kept as empty
    /// records.
    pub tsv: Vec<u8>,
    /// Set when the requested sheet could not be used and a later selector was.
    pub fallback: Option<String>,
}

/// Re-encode the first sheet matched by `selectors` (tried in order) as tab-delimited text.
pub fn sheet_to_tsv(bytes: &[u8], selectors: &[SheetSelector]) -> DatasetResult<SheetText> {
    let mut workbook = open_workbook(bytes)?;
    let names = workbook.sheet_names();

    let mut failures: Vec<String> = Vec::new();
    for selector in selectors {
        match resolve(&mut workbook, &names, selector) {
            Ok((sheet, range)) => {
                let fallback = if failures.is_empty() {
                    None
                } else {
                    Some(format!("{}; used '{sheet}' instead", failures.join("; ")))
                };
                return Ok(SheetText {
                    sheet,
                    tsv: range_to_tsv(&range)?,
                    fallback,
                });
            }
            Err(e) => failures.push(e.to_string()),
        }
    }

    Err(DatasetError::conversion(if failures.is_empty() {
        "no sheet selector given".to_string()
    } else {
        failures.join("; ")
    }))
}

fn resolve(
    workbook: &mut Workbook,
    names: &[String],
    selector: &SheetSelector,
) -> DatasetResult<(String, Range<Data>)> {
    let name = match selector {
        SheetSelector::Name(name) => names.iter().find(|n| *n == name).cloned(),
        SheetSelector::Ordinal(idx) => names.get(*idx).cloned(),
    }
    .ok_or_else(|| DatasetError::SheetNotFound {
        sheet: selector.to_string(),
    })?;

    let range = workbook.worksheet_range(&name)?;
    Ok((name, range))
}

fn range_to_tsv(range: &Range<Data>) -> DatasetResult<Vec<u8>> {
    let mut wtr = ::csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(Vec::new());

    // `Range` starts at the first used cell. Pad the rows and columns above and to the left of
    // it so record indices match sheet row indices.
    let Some((top, left)) = range.start() else {
        return finish(wtr);
    };
    let lead = left as usize;
    let blank = vec![String::new(); lead + range.width()];
    for _ in 0..top {
        wtr.write_record(&blank)?;
    }

    for row in range.rows() {
        let mut cells: Vec<String> = Vec::with_capacity(lead + row.len());
        cells.resize(lead, String::new());
        cells.extend(row.iter().map(cell_to_text));
        wtr.write_record(&cells)?;
    }
    finish(wtr)
}

fn finish(wtr: ::csv::Writer<Vec<u8>>) -> DatasetResult<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| DatasetError::conversion(format!("failed to flush sheet text: {e}")))
}

/// Text a cell carries once re-encoded; error cells and empties become `""`.
fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .is_datetime()
            .then(|| dt.as_datetime())
            .flatten()
            .map(|t| t.format(DATETIME_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
    }
}
