//! Deduplication engine: concatenates datasets and keeps the first record per
//! address, with provenance for survivors and discarded rows

use crate::error::{Error, Result};
use crate::normalizer::{address_key, format_for_display, standardize_all, NormalizedDataset};
use crate::parser::parse_table;
use crate::record::{AddressKey, CanonicalRecord, Provenance};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to do with rows whose address is blank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankAddressPolicy {
    /// Blank addresses share one key, so a single blank row survives
    #[default]
    Collapse,
    /// Blank-address rows are dropped before grouping
    Exclude,
}

/// A surviving record, formatted for output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Display-formatted record
    pub record: CanonicalRecord,
    /// Key the record was grouped under
    pub key: AddressKey,
    /// Row that provided this record
    pub provenance: Provenance,
}

/// A row discarded because an earlier row had the same address key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duplicate {
    /// The discarded record as it was read
    pub record: CanonicalRecord,
    /// Row the discarded record came from
    pub provenance: Provenance,
    /// Index into [`DedupResult::records`] of the row that was kept instead
    pub survivor: usize,
}

/// Row count of one input dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCount {
    pub label: String,
    pub rows: usize,
}

/// Counters reported for every run.
///
/// `total_rows` counts the rows that took part in grouping, so
/// `total_rows == unique_rows + duplicates` always holds. Rows dropped by
/// [`BlankAddressPolicy::Exclude`] are counted in `blank_rows_skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSummary {
    pub datasets: Vec<DatasetCount>,
    pub total_rows: usize,
    pub unique_rows: usize,
    pub duplicates: usize,
    pub blank_rows_skipped: usize,
}

/// The deduplicated output of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupResult {
    /// Surviving records in first-occurrence order
    pub records: Vec<MergedRecord>,
    /// Discarded rows in input order
    pub duplicates: Vec<Duplicate>,
    /// Run counters
    pub summary: DedupSummary,
    /// Files that contributed, in concatenation order
    pub sources: Vec<PathBuf>,
}

/// Everything known about one address key in a result
#[derive(Debug, Clone)]
pub struct Explanation<'a> {
    pub key: AddressKey,
    pub survivor: Option<&'a MergedRecord>,
    pub discarded: Vec<&'a Duplicate>,
}

impl DedupResult {
    /// Get the number of surviving rows
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Surviving records without provenance, in output order
    pub fn canonical_records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.iter().map(|r| &r.record)
    }

    /// Find the survivor for a key
    pub fn find_by_key(&self, key: &AddressKey) -> Option<(usize, &MergedRecord)> {
        self.records.iter().enumerate().find(|(_, r)| &r.key == key)
    }

    /// Discarded rows absorbed by the survivor at `index`
    pub fn duplicates_of(&self, index: usize) -> impl Iterator<Item = &Duplicate> {
        self.duplicates.iter().filter(move |d| d.survivor == index)
    }

    /// Explain what happened to rows with this raw address
    pub fn explain(&self, raw_address: &str) -> Explanation<'_> {
        let key = address_key(raw_address);
        match self.find_by_key(&key) {
            Some((index, survivor)) => Explanation {
                key,
                survivor: Some(survivor),
                discarded: self.duplicates_of(index).collect(),
            },
            None => Explanation {
                key,
                survivor: None,
                discarded: Vec::new(),
            },
        }
    }
}

/// Concatenate datasets in order and keep the first record per address key
pub fn deduplicate(datasets: &[NormalizedDataset], policy: BlankAddressPolicy) -> Result<DedupResult> {
    if datasets.is_empty() {
        return Err(Error::NoInputs);
    }

    let mut records: Vec<MergedRecord> = Vec::new();
    let mut duplicates: Vec<Duplicate> = Vec::new();
    let mut seen: HashMap<&AddressKey, usize> = HashMap::new();
    let mut summary = DedupSummary::default();

    for dataset in datasets {
        summary.datasets.push(DatasetCount {
            label: dataset.label.clone(),
            rows: dataset.len(),
        });

        for keyed in &dataset.records {
            if keyed.key.is_blank() && policy == BlankAddressPolicy::Exclude {
                summary.blank_rows_skipped += 1;
                continue;
            }

            summary.total_rows += 1;

            match seen.get(&keyed.key) {
                Some(&survivor) => duplicates.push(Duplicate {
                    record: keyed.record.clone(),
                    provenance: keyed.provenance.clone(),
                    survivor,
                }),
                None => {
                    seen.insert(&keyed.key, records.len());
                    records.push(MergedRecord {
                        record: format_for_display(&keyed.record, &keyed.key),
                        key: keyed.key.clone(),
                        provenance: keyed.provenance.clone(),
                    });
                }
            }
        }
    }

    summary.unique_rows = records.len();
    summary.duplicates = duplicates.len();

    if summary.blank_rows_skipped > 0 {
        warn!(
            skipped = summary.blank_rows_skipped,
            "dropped rows with a blank address"
        );
    }
    info!(
        total = summary.total_rows,
        unique = summary.unique_rows,
        duplicates = summary.duplicates,
        "deduplicated datasets"
    );

    Ok(DedupResult {
        records,
        duplicates,
        summary,
        sources: datasets.iter().map(|d| d.source_path.clone()).collect(),
    })
}

/// Standardize parsed tables and deduplicate them.
///
/// A dataset without usable Address data halts the run before any
/// grouping happens.
pub fn combine_tables(tables: &[Table], policy: BlankAddressPolicy) -> Result<DedupResult> {
    if tables.is_empty() {
        return Err(Error::NoInputs);
    }
    let datasets = standardize_all(tables)?;
    deduplicate(&datasets, policy)
}

/// Read input files in order, then standardize and deduplicate them.
///
/// Each file is read as CSV or as a workbook depending on its extension.
pub fn combine_files<P: AsRef<Path>>(paths: &[P], policy: BlankAddressPolicy) -> Result<DedupResult> {
    let mut tables: Vec<Table> = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(parse_table(path)?);
    }

    combine_tables(&tables, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn tables(sources: &[(&str, &str)]) -> Vec<Table> {
        sources
            .iter()
            .map(|(csv, name)| parse_csv_str(csv, name).unwrap())
            .collect()
    }

    #[test]
    fn test_full_name_and_split_names_collapse() {
        let input = tables(&[
            (
                "FullName,Address,City,State,Zip\nJohn Smith,123 Main Street.,Ada,MI,49301\n",
                "a.csv",
            ),
            (
                "First,Last,Address,City,State,Zip\njohn,smith,123 main st,ada,mi,49301\n",
                "b.csv",
            ),
        ]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(
            result.records[0].record.values(),
            ["John", "Smith", "123 Main St", "Ada", "Mi", "49301"]
        );
        assert_eq!(result.summary.total_rows, 2);
        assert_eq!(result.summary.unique_rows, 1);
        assert_eq!(result.summary.duplicates, 1);
    }

    #[test]
    fn test_first_occurrence_wins_across_datasets() {
        let input = tables(&[
            ("First,Address\nalice,9 Oak Road\n", "a.csv"),
            ("First,Address\nbob,9 oak rd\ncarol,10 Oak Rd\n", "b.csv"),
        ]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.records[0].record.first, "Alice");
        assert_eq!(result.records[0].provenance, Provenance::new("File 1", 1));
        assert_eq!(result.records[1].record.first, "Carol");
        assert_eq!(result.records[1].provenance, Provenance::new("File 2", 2));

        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.duplicates[0].record.first, "bob");
        assert_eq!(result.duplicates[0].survivor, 0);
    }

    #[test]
    fn test_duplicates_within_one_dataset() {
        let input = tables(&[(
            "Address\n1 Elm St\n2 Elm St\n1  ELM  STREET\n2 elm st.\n",
            "a.csv",
        )]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        let addresses: Vec<&str> = result.canonical_records().map(|r| r.address.as_str()).collect();
        assert_eq!(addresses, vec!["1 Elm St", "2 Elm St"]);
        assert_eq!(result.summary.duplicates, 2);
    }

    #[test]
    fn test_word_boundary_keeps_addresses_apart() {
        let input = tables(&[("Address\n42 Streetwood Ave\n42 St wood Ave\n", "a.csv")]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.records[0].record.address, "42 Streetwood Ave");
    }

    #[test]
    fn test_blank_addresses_collapse_by_default() {
        let input = tables(&[("First,Address\nann,1 Elm St\nben,\ncal,\n", "a.csv")]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.records[1].record.first, "Ben");
        assert_eq!(result.records[1].record.address, "");
        assert_eq!(result.summary.duplicates, 1);
        assert_eq!(result.summary.blank_rows_skipped, 0);
    }

    #[test]
    fn test_blank_addresses_excluded() {
        let input = tables(&[("First,Address\nann,1 Elm St\nben,\ncal,\n", "a.csv")]);

        let result = combine_tables(&input, BlankAddressPolicy::Exclude).unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.summary.blank_rows_skipped, 2);
        assert_eq!(result.summary.total_rows, 1);
        assert_eq!(result.summary.datasets[0].rows, 3);
    }

    #[test]
    fn test_counter_law() {
        let input = tables(&[
            ("Address\n1 A St\n2 B St\n1 a street\n\n", "a.csv"),
            ("Address\n2 b st.\n3 C Rd\n\n3 c road\n", "b.csv"),
        ]);

        for policy in [BlankAddressPolicy::Collapse, BlankAddressPolicy::Exclude] {
            let s = combine_tables(&input, policy).unwrap().summary;
            assert_eq!(s.total_rows, s.unique_rows + s.duplicates);
        }
    }

    #[test]
    fn test_schema_error_halts_before_output() {
        let input = tables(&[
            ("Address\n1 Elm St\n", "a.csv"),
            ("Name,Phone\nJohn,555\n", "b.csv"),
        ]);

        let err = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap_err();
        assert!(matches!(err, Error::Schema { ref dataset, .. } if dataset == "File 2"));
    }

    #[test]
    fn test_no_inputs() {
        assert!(matches!(
            combine_tables(&[], BlankAddressPolicy::Collapse),
            Err(Error::NoInputs)
        ));
        assert!(matches!(
            deduplicate(&[], BlankAddressPolicy::Collapse),
            Err(Error::NoInputs)
        ));
    }

    #[test]
    fn test_provenance_rows_after_skipped_row() {
        let input = tables(&[("Address,City\n1 A St,Ada\n,\n2 B St,Ada\n", "a.csv")]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(result.records[1].provenance, Provenance::new("File 1", 3));
        assert_eq!(result.records[1].provenance.to_string(), "File 1, row 3");
    }

    #[test]
    fn test_survivor_zip_text_unchanged() {
        let input = tables(&[(
            "Address,Zip\n1 A St,+49301\n2 A St,49301.50\n3 A St,4930e1\n4 A St,49301.0\n5 A St,01234\n",
            "a.csv",
        )]);

        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        let zips: Vec<&str> = result.canonical_records().map(|r| r.zip.as_str()).collect();
        assert_eq!(zips, vec!["+49301", "49301.50", "4930e1", "49301.0", "01234"]);
    }

    #[test]
    fn test_combine_files_reads_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "Address\n1 Elm St\n").unwrap();
        std::fs::write(&b, "Address\n1 elm street\n2 Elm St\n").unwrap();

        let result = combine_files(&[a, b], BlankAddressPolicy::Collapse).unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.summary.duplicates, 1);
    }

    #[test]
    fn test_combine_files_unreadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.xlsx");
        std::fs::write(&a, "Address\n1 Elm St\n").unwrap();
        std::fs::write(&b, "not a workbook").unwrap();

        let err = combine_files(&[a, b], BlankAddressPolicy::Collapse).unwrap_err();
        assert!(matches!(err, Error::Workbook { .. }));
    }

    #[test]
    fn test_explain() {
        let input = tables(&[
            ("First,Address\nann,5 Pine Road\n", "a.csv"),
            ("First,Address\nbo,5 pine rd\ncy,6 Pine Rd\n", "b.csv"),
        ]);
        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        let explained = result.explain("5 PINE RD.");
        assert_eq!(explained.key.as_str(), "5 pine rd");
        assert_eq!(explained.survivor.unwrap().record.first, "Ann");
        assert_eq!(explained.discarded.len(), 1);
        assert_eq!(explained.discarded[0].provenance, Provenance::new("File 2", 1));

        let missing = result.explain("7 Pine Rd");
        assert!(missing.survivor.is_none());
        assert!(missing.discarded.is_empty());
    }

    #[test]
    fn test_sources_in_concatenation_order() {
        let input = tables(&[("Address\n1 A St\n", "a.csv"), ("Address\n2 B St\n", "b.csv")]);
        let result = combine_tables(&input, BlankAddressPolicy::Collapse).unwrap();

        assert_eq!(
            result.sources,
            vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]
        );
    }
}
