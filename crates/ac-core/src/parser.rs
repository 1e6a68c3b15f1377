//! Parsers for input address lists (CSV and spreadsheet workbooks)

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use crate::workbook::{parse_workbook, WORKBOOK_EXTENSIONS};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_reader(BufReader::new(file), path.to_path_buf())
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_reader(content.as_bytes(), PathBuf::from(source_name))
}

/// Parse an input file, picking the reader from its extension.
///
/// `.xlsx`, `.xlsm`, `.xls` and `.ods` go through the workbook reader;
/// everything else is read as CSV.
pub fn parse_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if is_workbook(path) {
        parse_workbook(path)
    } else {
        parse_csv(path)
    }
}

/// Check whether a path names a spreadsheet workbook
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_reader<R: Read>(reader: R, path: PathBuf) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;
        records.push(record.iter().map(CellValue::parse).collect());
    }

    build_table(path, &headers, records)
}

/// Assemble a table from a header row and data rows.
///
/// Header names are trimmed so " Address " still maps to Address. Short
/// rows are padded, long rows truncated, and fully empty rows skipped while
/// keeping each kept row's source row number.
pub(crate) fn build_table<I>(path: PathBuf, headers: &[String], records: I) -> Result<Table>
where
    I: IntoIterator<Item = Vec<CellValue>>,
{
    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.trim().to_string(), i))
        .collect();

    if columns.iter().all(|c| c.name.is_empty()) {
        return Err(Error::CsvParse {
            path,
            message: "no columns found".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, mut cells) in records.into_iter().enumerate() {
        let line = row_idx + 1;

        // Spreadsheet exports often end with rows of bare commas
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }

        if cells.len() < columns.len() {
            cells.resize(columns.len(), CellValue::Empty);
        }

        if cells.len() > columns.len() {
            warn!(
                row = line,
                path = %path.display(),
                "row has more cells than columns, truncating"
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(line, cells));
    }

    debug!(
        path = %path.display(),
        columns = columns.len(),
        rows = rows.len(),
        "parsed table"
    );

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}
