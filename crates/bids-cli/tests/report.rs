//! Integration tests for run report export.

use std::fs;

use bids_cli::report::{ReportError, RunWindow, write_report};
use bids_model::{BatchReport, StepOutcome, SubjectReport};
use chrono::{TimeZone, Utc};

fn subject(folder: &str, raw_id: &str, anon: &str) -> SubjectReport {
    SubjectReport {
        folder: folder.to_string(),
        raw_id: raw_id.to_string(),
        anonymized_id: anon.to_string(),
        ambiguous_with: Vec::new(),
        archive: StepOutcome::Completed,
        deface: StepOutcome::Completed,
        defaced_files: 1,
        physio_present: true,
    }
}

fn sample_report() -> BatchReport {
    let mut failed = subject("0099_Study", "0099", "A2");
    failed.archive = StepOutcome::failed("dcm2bids exited unsuccessfully (exit status: 1)");
    failed.deface = StepOutcome::skipped("no anat directory");
    failed.defaced_files = 0;
    failed.physio_present = false;

    let mut report = BatchReport::new("01");
    report.subjects = vec![subject("0012_Study", "0012", "A1"), failed];
    report.unmatched = vec!["9999_Study".to_string()];
    report
}

fn window() -> RunWindow {
    RunWindow {
        started_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        finished_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 42, 10).unwrap(),
    }
}

#[test]
fn json_report_has_totals_and_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");

    write_report(&path, &sample_report(), window()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["session"], "01");
    assert_eq!(value["started_at"], "2026-03-02T09:00:00Z");
    assert_eq!(value["totals"]["converted"], 1);
    assert_eq!(value["totals"]["failed"], 1);
    assert_eq!(value["totals"]["not_found"], 1);
    assert_eq!(value["totals"]["missing_physio"], 1);
    assert_eq!(value["subjects"][0]["status"], "converted");
    assert!(value["subjects"][0]["notes"].is_null());
    assert_eq!(value["subjects"][1]["archive"]["outcome"], "failed");
    assert_eq!(
        value["subjects"][1]["notes"],
        "dcm2bids error: dcm2bids exited unsuccessfully (exit status: 1); no physio file"
    );
    assert_eq!(value["unmatched"][0], "9999_Study");
}

#[test]
fn csv_report_has_one_row_per_folder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.CSV");

    write_report(&path, &sample_report(), window()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "folder");
    assert_eq!(&headers[3], "status");
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][3], "converted");
    assert_eq!(&rows[1][3], "failed");
    assert_eq!(&rows[1][5], "skipped");
    assert_eq!(&rows[2][0], "9999_Study");
    assert_eq!(&rows[2][3], "not_found");
    assert_eq!(&rows[2][7], "");
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.txt");

    let error = write_report(&path, &sample_report(), window()).unwrap_err();

    assert!(matches!(error, ReportError::UnsupportedFormat { .. }));
    assert!(!path.exists());
}
