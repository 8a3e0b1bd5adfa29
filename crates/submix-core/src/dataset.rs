//! In-memory record store for one parsed submission file.

use std::collections::{HashMap, HashSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of a record, as found in the input.
///
/// Fields written in canonical decimal form of a signed 64-bit integer
/// become [`RecordId::Number`]; everything else, including `01`, `+1` and
/// padded cells, is kept verbatim as [`RecordId::Text`]. Displaying an id
/// therefore reproduces the original cell. The two variants never compare
/// equal, so `1` and `"one"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer identifier.
    Number(i64),
    /// Any other identifier.
    Text(String),
}

impl RecordId {
    /// Coerce a raw table cell into an id.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One identifier + text pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
    /// Record identifier.
    pub id: RecordId,
    /// Record text; empty when the source cell was absent.
    #[serde(default)]
    pub text: String,
}

impl Record {
    /// Build a record from anything convertible into an id.
    pub fn new(id: impl Into<RecordId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A named, ordered, immutable collection of records.
///
/// The name is for display only and need not be unique. Ids need not be
/// unique within a dataset either; lookups by id return the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Dataset {
    name: String,
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset from its display name and records.
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records in input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in record order, duplicates included.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.iter().map(|r| &r.id)
    }

    /// Set of distinct ids.
    pub fn id_set(&self) -> HashSet<&RecordId> {
        self.ids().collect()
    }

    /// First record for each distinct id.
    pub fn first_by_id(&self) -> HashMap<&RecordId, &Record> {
        let mut first = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            first.entry(&record.id).or_insert(record);
        }
        first
    }
}
