//! Canonical record shape shared by every dataset after schema mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed output columns, in output order
pub const CANONICAL_COLUMNS: [&str; 6] = ["First", "Last", "Address", "City", "State", "Zip"];

/// One contact/address entry with the fixed six-attribute shape.
///
/// Unavailable attributes are empty strings, never missing. Field order
/// matches [`CANONICAL_COLUMNS`], which is also the serialized order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalRecord {
    pub first: String,
    pub last: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl CanonicalRecord {
    /// Attribute values in canonical column order
    pub fn values(&self) -> [&str; 6] {
        [
            &self.first,
            &self.last,
            &self.address,
            &self.city,
            &self.state,
            &self.zip,
        ]
    }

    /// Look up an attribute by its canonical column name
    pub fn get(&self, column: &str) -> Option<&str> {
        CANONICAL_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values()[i])
    }
}

/// Normalized address text used only to decide whether two records are the
/// same physical address. Never written to output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressKey(String);

impl AddressKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key every blank address shares
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record came from: dataset label plus 1-based data row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub dataset: String,
    pub row: usize,
}

impl Provenance {
    pub fn new(dataset: impl Into<String>, row: usize) -> Self {
        Self {
            dataset: dataset.into(),
            row,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, row {}", self.dataset, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_follow_canonical_order() {
        let record = CanonicalRecord {
            first: "a".into(),
            last: "b".into(),
            address: "c".into(),
            city: "d".into(),
            state: "e".into(),
            zip: "f".into(),
        };

        assert_eq!(record.values(), ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(record.get("City"), Some("d"));
        assert_eq!(record.get("FullName"), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(CanonicalRecord::default()).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        for column in CANONICAL_COLUMNS {
            assert!(keys.contains(&column), "missing {column}");
        }
    }
}
