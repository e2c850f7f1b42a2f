//! Run report export for the convert pass.
//!
//! The output format follows the file extension: `.json` gets the full
//! report with totals, `.csv` gets one row per folder.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use bids_model::{BatchReport, SubjectReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize report {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write report {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported report format for {path} (expected .json or .csv)")]
    UnsupportedFormat { path: PathBuf },
}

/// When the pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunWindow {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Totals {
    converted: usize,
    skipped: usize,
    failed: usize,
    not_found: usize,
    missing_physio: usize,
    ambiguous: usize,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    window: RunWindow,
    session: &'a str,
    totals: Totals,
    subjects: Vec<SubjectEntry<'a>>,
    unmatched: &'a [String],
}

#[derive(Debug, Serialize)]
struct SubjectEntry<'a> {
    status: &'static str,
    #[serde(flatten)]
    report: &'a SubjectReport,
    notes: Option<String>,
}

/// One flat CSV row. Folders without a mapping row get status `not_found`.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    folder: &'a str,
    raw_id: &'a str,
    anonymized_id: &'a str,
    status: &'static str,
    archive: &'static str,
    deface: &'static str,
    defaced_files: usize,
    physio_present: Option<bool>,
    notes: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

/// Write `report` to `path` as JSON or CSV depending on the extension.
///
/// # Errors
///
/// Returns an error for unknown extensions or when the file cannot be
/// written.
pub fn write_report(path: &Path, report: &BatchReport, window: RunWindow) -> Result<(), ReportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => write_json(path, report, window),
        Some("csv") => write_csv(path, report, window),
        _ => Err(ReportError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn write_json(path: &Path, report: &BatchReport, window: RunWindow) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let document = JsonReport {
        window,
        session: &report.session,
        totals: Totals {
            converted: report.converted_count(),
            skipped: report.skipped_count(),
            failed: report.failed_count(),
            not_found: report.not_found_count(),
            missing_physio: report.missing_physio_count(),
            ambiguous: report.ambiguous_count(),
        },
        subjects: report
            .subjects
            .iter()
            .map(|subject| SubjectEntry {
                status: subject.status().as_str(),
                report: subject,
                notes: subject.notes(),
            })
            .collect(),
        unmatched: &report.unmatched,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, &document).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)
}

fn write_csv(path: &Path, report: &BatchReport, window: RunWindow) -> Result<(), ReportError> {
    let csv_error = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for subject in &report.subjects {
        writer
            .serialize(CsvRow {
                folder: &subject.folder,
                raw_id: &subject.raw_id,
                anonymized_id: &subject.anonymized_id,
                status: subject.status().as_str(),
                archive: subject.archive.label(),
                deface: subject.deface.label(),
                defaced_files: subject.defaced_files,
                physio_present: Some(subject.physio_present),
                notes: subject.notes().unwrap_or_default(),
                started_at: window.started_at,
                finished_at: window.finished_at,
            })
            .map_err(csv_error)?;
    }
    for folder in &report.unmatched {
        writer
            .serialize(CsvRow {
                folder,
                raw_id: "",
                anonymized_id: "",
                status: "not_found",
                archive: "",
                deface: "",
                defaced_files: 0,
                physio_present: None,
                notes: "no mapping found".to_string(),
                started_at: window.started_at,
                finished_at: window.finished_at,
            })
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
