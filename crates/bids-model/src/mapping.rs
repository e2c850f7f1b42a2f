use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One row of the raw-to-anonymized identifier lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    /// Scanner-assigned study identifier, trimmed.
    pub raw_id: String,
    /// Pseudonymized subject code used in archive paths, trimmed.
    pub anonymized_id: String,
    /// 1-based row number in the source sheet (header is row 1).
    pub row_number: usize,
}

impl MappingRow {
    pub fn new(raw_id: impl Into<String>, anonymized_id: impl Into<String>) -> Self {
        Self {
            raw_id: raw_id.into(),
            anonymized_id: anonymized_id.into(),
            row_number: 0,
        }
    }

    #[must_use]
    pub fn with_row_number(mut self, row_number: usize) -> Self {
        self.row_number = row_number;
        self
    }

    pub fn has_anonymized_id(&self) -> bool {
        !self.anonymized_id.is_empty()
    }
}

/// A per-subject directory found directly under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFolder {
    pub name: String,
    pub path: PathBuf,
}

/// Result of resolving a name against the mapping table.
///
/// Rows are always considered in table order; `Ambiguous` keeps the first
/// qualifying row as `chosen` and lists the rest so callers can flag it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    Unmatched,
    Unique(&'a MappingRow),
    Ambiguous {
        chosen: &'a MappingRow,
        also: Vec<&'a MappingRow>,
    },
}

impl<'a> MatchOutcome<'a> {
    /// The first qualifying row, if any.
    pub fn chosen(&self) -> Option<&'a MappingRow> {
        match self {
            MatchOutcome::Unmatched => None,
            MatchOutcome::Unique(row) => Some(row),
            MatchOutcome::Ambiguous { chosen, .. } => Some(chosen),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MatchOutcome::Ambiguous { .. })
    }

    /// Raw identifiers of the rows that also qualified but were not chosen.
    pub fn alternatives(&self) -> Vec<String> {
        match self {
            MatchOutcome::Ambiguous { also, .. } => {
                also.iter().map(|row| row.raw_id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}
