//! ac-core: Core library for combining and deduplicating address lists
//!
//! This library provides functionality to:
//! - Parse contact spreadsheets (CSV exports or workbooks) into raw tables
//! - Map arbitrary column layouts onto a fixed six-column record
//! - Normalize addresses into comparison keys
//! - Deduplicate several datasets, keeping the first occurrence of each address
//! - Export the result atomically as CSV or JSON

pub mod dedup;
pub mod error;
pub mod export;
pub mod job;
pub mod normalizer;
pub mod parser;
pub mod record;
pub mod report;
pub mod table;
pub mod workbook;

pub use dedup::{
    combine_files, combine_tables, deduplicate, BlankAddressPolicy, DatasetCount, DedupResult,
    DedupSummary, Duplicate, Explanation, MergedRecord,
};
pub use error::{Error, Result};
pub use export::{default_output_path, export, write_atomic, OutputFormat};
pub use job::{JobFile, JobInput, JobOutcome};
pub use normalizer::{
    address_key, format_for_display, standardize, standardize_all, title_case, KeyedRecord,
    NormalizedDataset,
};
pub use parser::{is_workbook, parse_csv, parse_csv_str, parse_table};
pub use record::{AddressKey, CanonicalRecord, Provenance, CANONICAL_COLUMNS};
pub use report::{render_preview, render_summary, render_table, DEFAULT_PREVIEW_ROWS};
pub use table::{CellValue, Column, Row, Table};
pub use workbook::{parse_workbook, WORKBOOK_EXTENSIONS};
