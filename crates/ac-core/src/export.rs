//! Writing deduplicated results to disk
//!
//! Output is rendered fully in memory, written to a temporary sibling file
//! and renamed into place, so a failed run never leaves a partial file.

use crate::dedup::{DedupResult, DedupSummary};
use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, CANONICAL_COLUMNS};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// JSON export layout
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    generated_at: DateTime<Utc>,
    summary: &'a DedupSummary,
    records: Vec<&'a CanonicalRecord>,
}

/// Default output file name for a run on `date`, e.g. `Oct_Addresses.csv`
pub fn default_output_name(date: NaiveDate, format: OutputFormat) -> String {
    format!("{}_Addresses.{}", date.format("%b"), format.extension())
}

/// Default output path for a run today, in the current directory
pub fn default_output_path(format: OutputFormat) -> PathBuf {
    let today = Local::now().date_naive();
    PathBuf::from(default_output_name(today, format))
}

/// Render records as CSV with the canonical header, even when empty
pub fn render_csv<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let to_error = |e: csv::Error| Error::Csv {
        path: PathBuf::from("<output>"),
        source: e,
    };

    writer.write_record(CANONICAL_COLUMNS).map_err(to_error)?;
    for record in records {
        writer.write_record(record.values()).map_err(to_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Render a result as a pretty JSON document with its summary
pub fn render_json(result: &DedupResult) -> Result<Vec<u8>> {
    let doc = ExportDocument {
        generated_at: Utc::now(),
        summary: &result.summary,
        records: result.canonical_records().collect(),
    };
    let mut bytes = serde_json::to_vec_pretty(&doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write `contents` to `path` through a temporary file in the same directory
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_path_for(path);

    let write_err = |source: std::io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Export a result to `path` in the given format
pub fn export<P: AsRef<Path>>(result: &DedupResult, path: P, format: OutputFormat) -> Result<()> {
    let path = path.as_ref();
    let bytes = match format {
        OutputFormat::Csv => render_csv(result.canonical_records())?,
        OutputFormat::Json => render_json(result)?,
    };
    write_atomic(path, &bytes)?;

    info!(
        rows = result.row_count(),
        path = %path.display(),
        format = format.extension(),
        "exported unique addresses"
    );
    Ok(())
}
