//! Error types for mapping-table loading and input discovery.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the mapping table or walking inputs.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file not found.
    #[error("mapping file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Extension is neither a delimited text export nor a workbook.
    #[error("unsupported mapping file format: {path} (expected .csv, .tsv, .xlsx, .xls or .ods)")]
    UnsupportedFormat { path: PathBuf },

    // === Parsing Errors ===
    /// Failed to read a delimited text export.
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to open or read a workbook.
    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// The table has no header row.
    #[error("mapping table is empty: {path}")]
    EmptyTable { path: PathBuf },

    // === Schema Errors ===
    /// Positional loading needs at least two columns.
    #[error("mapping table {path} has {found} column(s), expected at least 2")]
    TooFewColumns { path: PathBuf, found: usize },

    /// Named loading needs the `RawID` and `AnonymizedID` headers.
    #[error("mapping table {path} must contain 'RawID' and 'AnonymizedID' columns (missing: {})", .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the table's shape rather than by I/O.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            IngestError::TooFewColumns { .. } | IngestError::MissingColumns { .. }
        )
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/mapping.xlsx"),
        };
        assert_eq!(err.to_string(), "mapping file not found: /path/to/mapping.xlsx");
    }

    #[test]
    fn test_missing_columns_display() {
        let err = IngestError::MissingColumns {
            path: PathBuf::from("ids.csv"),
            missing: vec!["AnonymizedID".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "mapping table ids.csv must contain 'RawID' and 'AnonymizedID' columns (missing: AnonymizedID)"
        );
        assert!(err.is_schema_error());
    }
}
