//! Spreadsheet workbook reader (xlsx, xlsm, xls, ods)
//!
//! Only the first worksheet is read. Its first row is the header.

use crate::error::{Error, Result};
use crate::parser::build_table;
use crate::table::{CellValue, Table};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// File extensions read through the workbook reader (lowercase)
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Parse the first worksheet of a workbook into a Table
pub fn parse_workbook<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let workbook_error = |message: String| Error::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("no worksheet found".to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();

    let records = rows.map(|row| row.iter().map(cell_value).collect::<Vec<_>>());

    build_table(path.to_path_buf(), &headers, records)
}

/// Convert a workbook cell.
///
/// Numbers keep their native type. Text is trimmed like CSV cells, and
/// anything else (dates, booleans, error cells) is kept as its display text.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::parse(s),
        Data::Empty => CellValue::Empty,
        other => CellValue::parse(&other.to_string()),
    }
}
