//! Integration tests for rendered summaries.

use std::path::{Path, PathBuf};

use bids_cli::summary::{conversion_table, conversion_totals_table, physio_dry_run_listing};
use bids_model::{BatchReport, PhysioCandidate, PhysioScan, StepOutcome, SubjectReport};

fn candidate(file: &str, raw_id: &str, anon: &str) -> PhysioCandidate {
    PhysioCandidate {
        raw_id: raw_id.to_string(),
        anonymized_id: anon.to_string(),
        source_path: PathBuf::from(format!("/dicom/{raw_id}_Study/physio/{file}")),
        target_dir: PathBuf::from(format!("/bids/sub-{anon}/ses-01/func")),
    }
}

#[test]
fn dry_run_listing_is_numbered() {
    let scan = PhysioScan {
        candidates: vec![
            candidate("0012_rest.puls", "0012", "A1"),
            candidate("0099_task.puls", "0099", "A2"),
        ],
        unmatched: vec![PathBuf::from("/dicom/5555_Study/5555_rest.puls")],
        missing_anonymized: Vec::new(),
    };

    let listing = physio_dry_run_listing(&scan, Some(Path::new("/bids/bidsphysio_dryrun.log")));

    insta::assert_snapshot!(listing, @r"
    DRY RUN SUMMARY
    ============================================================
    01. 0012_rest.puls
       raw id     : 0012
       anon id    : A1
       target dir : /bids/sub-A1/ses-01/func
    ------------------------------------------------------------
    02. 0099_task.puls
       raw id     : 0099
       anon id    : A2
       target dir : /bids/sub-A2/ses-01/func
    ------------------------------------------------------------
    Total 2 files to convert
    Skipped: 1 without mapping, 0 without anonymized id
    Log file: /bids/bidsphysio_dryrun.log
    Dry run complete, no conversions executed.
    ");
}

#[test]
fn empty_dry_run_still_reports_total() {
    let listing = physio_dry_run_listing(&PhysioScan::default(), None);

    assert!(listing.contains("Total 0 files to convert"));
    assert!(!listing.contains("Skipped"));
    assert!(!listing.contains("Log file"));
}

#[test]
fn conversion_tables_show_subjects_and_counts() {
    let mut report = BatchReport::new("01");
    report.subjects.push(SubjectReport {
        folder: "0012_Study".to_string(),
        raw_id: "0012".to_string(),
        anonymized_id: "A1".to_string(),
        ambiguous_with: vec!["12".to_string()],
        archive: StepOutcome::skipped("already converted"),
        deface: StepOutcome::Completed,
        defaced_files: 1,
        physio_present: true,
    });
    report.unmatched.push("9999_Study".to_string());

    let subjects = conversion_table(&report).to_string();
    assert!(subjects.contains("0012_Study"));
    assert!(subjects.contains("sub-A1"));
    assert!(subjects.contains("skipped"));

    let totals = conversion_totals_table(&report).to_string();
    assert!(totals.contains("Not found in mapping"));
    assert!(totals.contains("Ambiguous matches"));
}

#[test]
fn failed_total_label_is_plain_and_count_is_highlighted() {
    let mut report = BatchReport::new("01");
    report.subjects.push(SubjectReport {
        folder: "0012_Study".to_string(),
        raw_id: "0012".to_string(),
        anonymized_id: "A1".to_string(),
        ambiguous_with: Vec::new(),
        archive: StepOutcome::failed("dcm2bids exited unsuccessfully"),
        deface: StepOutcome::skipped("conversion failed"),
        defaced_files: 0,
        physio_present: false,
    });

    let mut totals = conversion_totals_table(&report);
    totals.enforce_styling();
    let rendered = totals.to_string();
    let line = rendered
        .lines()
        .find(|line| line.contains("Failed"))
        .expect("failed row");
    let cells: Vec<&str> = line.split('│').map(str::trim).collect();

    // Same plain label style as the other outcome rows.
    assert_eq!(cells[1], "Failed");
    assert!(cells[2].contains('\u{1b}'));
}
