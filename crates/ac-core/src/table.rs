//! Raw table types for input spreadsheets (CSV exports and workbooks)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed table from a single input file, before any schema mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, in file order
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Create a new empty table
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            source_path,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether a column with this exact name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Iterate over the cells of a named column, one per row.
    ///
    /// Yields nothing if the column does not exist.
    pub fn column_cells<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let index = self.find_column(name).map(|c| c.index);
        self.rows
            .iter()
            .filter_map(move |r| index.and_then(|i| r.get(i)))
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header (trimmed)
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// 1-based data row number in the source, counting rows that were skipped
    pub line: usize,
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(line: usize, cells: Vec<CellValue>) -> Self {
        Self { line, cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A cell value.
///
/// Text files only ever produce `String` or `Empty`: the text is kept as
/// written (trimmed) so codes like zips are never coerced. Workbooks store
/// numbers natively and produce `Integer` or `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Wrap cell text, trimming it; blank text becomes `Empty`
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(trimmed.to_string())
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell is empty or holds only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_keeps_text_verbatim() {
        for zip in ["49301", "01234", "+49301", "49301.50", "4930e1", "49301.0", "49301-1234"] {
            assert_eq!(CellValue::parse(zip), CellValue::String(zip.to_string()));
            assert_eq!(CellValue::parse(zip).to_string_value(), zip);
        }
    }

    #[test]
    fn test_cell_value_trims() {
        assert_eq!(
            CellValue::parse(" 123 Main St "),
            CellValue::String("123 Main St".to_string())
        );
    }

    #[test]
    fn test_cell_value_parse_empty() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("   "), CellValue::Empty);
    }

    #[test]
    fn test_numeric_cells_display() {
        assert_eq!(CellValue::Integer(49301).to_string_value(), "49301");
        assert_eq!(CellValue::Float(49301.0).to_string_value(), "49301");
        assert_eq!(CellValue::Float(2.5).to_string_value(), "2.5");
    }

    #[test]
    fn test_cell_value_is_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::String("  ".to_string()).is_blank());
        assert!(!CellValue::Integer(0).is_blank());
        assert!(!CellValue::String("x".to_string()).is_blank());
    }

    #[test]
    fn test_column_cells_missing_column() {
        let mut table = Table::new(PathBuf::from("t.csv"));
        table.columns.push(Column::new("Address".to_string(), 0));
        table.rows.push(Row::new(1, vec![CellValue::parse("1 Elm St")]));

        assert_eq!(table.column_cells("Address").count(), 1);
        assert_eq!(table.column_cells("Zip").count(), 0);
        assert!(table.has_column("Address"));
        assert!(!table.has_column("address"));
    }
}
