//! Schema mapping and address normalization
//!
//! Maps a raw table with arbitrary columns onto [`CanonicalRecord`]s and
//! derives the [`AddressKey`] each record is deduplicated on.

use crate::error::{Error, Result};
use crate::record::{AddressKey, CanonicalRecord, Provenance, CANONICAL_COLUMNS};
use crate::table::{CellValue, Table};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
    static ref STREET_RE: Regex = Regex::new(r"\bstreet\b").expect("valid street pattern");
    static ref ROAD_RE: Regex = Regex::new(r"\broad\b").expect("valid road pattern");
}

/// Column holding a combined "first last" name in some exports
pub const FULL_NAME_COLUMN: &str = "FullName";

/// A canonical record together with its dedup key and origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRecord {
    pub key: AddressKey,
    pub record: CanonicalRecord,
    pub provenance: Provenance,
}

/// One input dataset after schema mapping and key derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDataset {
    /// Label used in summaries and errors (e.g. "File 1")
    pub label: String,
    /// File the dataset was read from
    pub source_path: PathBuf,
    /// Records in source order
    pub records: Vec<KeyedRecord>,
}

impl NormalizedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Derive the comparison key for a raw address.
///
/// Trims, lowercases, drops periods, collapses whitespace runs and
/// abbreviates the standalone words "street" and "road". Total and pure.
pub fn address_key(raw: &str) -> AddressKey {
    let lowered = raw.trim().to_lowercase().replace('.', "");
    let collapsed = WHITESPACE_RE.replace_all(lowered.trim(), " ");
    let street = STREET_RE.replace_all(&collapsed, "st");
    let road = ROAD_RE.replace_all(&street, "rd");
    AddressKey::new(road.into_owned())
}

/// Key for a possibly missing cell; missing cells share the blank key
pub fn cell_address_key(cell: Option<&CellValue>) -> AddressKey {
    match cell {
        Some(c) => address_key(&c.to_string_value()),
        None => AddressKey::default(),
    }
}

/// Title-case each whitespace-separated word, collapsing the separators
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Split a full name on its first whitespace run into (first, last)
pub fn split_full_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.find(char::is_whitespace) {
        Some(idx) => (
            full[..idx].to_string(),
            full[idx..].trim_start().to_string(),
        ),
        None => (full.to_string(), String::new()),
    }
}

/// Render a surviving record for output.
///
/// Names, city, state and the address key are title-cased; zip is only
/// trimmed so leading zeros survive.
pub fn format_for_display(record: &CanonicalRecord, key: &AddressKey) -> CanonicalRecord {
    CanonicalRecord {
        first: title_case(&record.first),
        last: title_case(&record.last),
        address: title_case(key.as_str()),
        city: title_case(&record.city),
        state: title_case(&record.state),
        zip: record.zip.trim().to_string(),
    }
}

/// Map one raw table onto canonical records and derive their keys.
///
/// Missing canonical columns become empty strings. A `FullName` column is
/// split into First/Last only when neither of those columns exists. Fails
/// with [`Error::Schema`] when no row has a non-blank Address.
pub fn standardize(table: &Table, label: &str) -> Result<NormalizedDataset> {
    let index_of = |name: &str| table.find_column(name).map(|c| c.index);
    let indices: Vec<Option<usize>> = CANONICAL_COLUMNS.iter().map(|c| index_of(*c)).collect();
    let full_name_idx = if indices[0].is_none() && indices[1].is_none() {
        index_of(FULL_NAME_COLUMN)
    } else {
        None
    };

    let mut records = Vec::with_capacity(table.row_count());
    for row in &table.rows {
        let text = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(CellValue::to_string_value)
                .unwrap_or_default()
        };

        let (first, last) = match full_name_idx {
            Some(i) => split_full_name(&text(Some(i))),
            None => (text(indices[0]), text(indices[1])),
        };

        let record = CanonicalRecord {
            first,
            last,
            address: text(indices[2]),
            city: text(indices[3]),
            state: text(indices[4]),
            zip: text(indices[5]),
        };

        records.push(KeyedRecord {
            key: address_key(&record.address),
            record,
            provenance: Provenance::new(label, row.line),
        });
    }

    if records.iter().all(|r| r.record.address.trim().is_empty()) {
        return Err(Error::Schema {
            dataset: label.to_string(),
            path: table.source_path.clone(),
        });
    }

    debug!(
        dataset = label,
        rows = records.len(),
        split_full_name = full_name_idx.is_some(),
        "standardized dataset"
    );

    Ok(NormalizedDataset {
        label: label.to_string(),
        source_path: table.source_path.clone(),
        records,
    })
}

/// Default label for the dataset at a 0-based position
pub fn dataset_label(position: usize) -> String {
    format!("File {}", position + 1)
}

/// Standardize every table, labelling them "File 1", "File 2", ...
///
/// Stops at the first dataset without usable Address data.
pub fn standardize_all(tables: &[Table]) -> Result<Vec<NormalizedDataset>> {
    tables
        .iter()
        .enumerate()
        .map(|(i, table)| standardize(table, &dataset_label(i)))
        .collect()
}
