//! Plain-text summary and preview of a deduplication run

use crate::dedup::{DedupResult, DedupSummary};
use crate::record::{CanonicalRecord, CANONICAL_COLUMNS};

/// Rows shown in a preview unless the caller asks otherwise
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Render the run counters, one per line
pub fn render_summary(summary: &DedupSummary) -> String {
    let mut out = String::new();
    for dataset in &summary.datasets {
        out.push_str(&format!("{} rows: {}\n", dataset.label, dataset.rows));
    }
    out.push_str(&format!("Total combined rows: {}\n", summary.total_rows));
    out.push_str(&format!("Duplicates found: {}\n", summary.duplicates));
    out.push_str(&format!("Unique addresses: {}\n", summary.unique_rows));
    if summary.blank_rows_skipped > 0 {
        out.push_str(&format!(
            "Blank addresses skipped: {}\n",
            summary.blank_rows_skipped
        ));
    }
    out
}

/// Render records as a left-aligned text table with the canonical header
pub fn render_table<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let rows: Vec<[&str; 6]> = records.into_iter().map(|r| r.values()).collect();

    let mut widths: Vec<usize> = CANONICAL_COLUMNS.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &CANONICAL_COLUMNS, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, values: &[&str; 6], widths: &[usize]) {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect();
    out.push_str(cells.join("  ").trim_end());
    out.push('\n');
}

/// Summary followed by the first `limit` output rows
pub fn render_preview(result: &DedupResult, limit: usize) -> String {
    let mut out = render_summary(&result.summary);
    let shown = limit.min(result.row_count());

    out.push_str(&format!("\nFirst {} rows:\n", shown));
    out.push_str(&render_table(result.canonical_records().take(shown)));

    if result.row_count() > shown {
        out.push_str(&format!("... ({} more rows)\n", result.row_count() - shown));
    }
    out
}
