//! Tests for the physio dry run and real run.

mod common;

use std::fs;
use std::path::PathBuf;

use bids_core::{PhysioOptions, ProcessRunner, run_physio_conversion, run_physio_dry_run};
use bids_model::{ArchiveLayout, StepOutcome};
use tempfile::TempDir;

use common::{RecordingRunner, arg_after, touch, write_mapping};

fn fixture(mapping: &str) -> (TempDir, PhysioOptions) {
    fixture_in(tempfile::tempdir().expect("temp dir"), mapping)
}

/// Same tree, rooted at a path relative to the current directory.
fn relative_fixture(mapping: &str) -> (TempDir, PhysioOptions) {
    let dir = tempfile::tempdir_in(".").expect("temp dir");
    assert!(dir.path().is_relative());
    fixture_in(dir, mapping)
}

fn fixture_in(dir: TempDir, mapping: &str) -> (TempDir, PhysioOptions) {
    let dicom = dir.path().join("dicom");
    let bids = dir.path().join("bids");
    touch(&dicom, "0012_Study/physio/0012_rest.puls");
    touch(&dicom, "0012_Study/IM0001.dcm");
    touch(&dicom, "0099_Study/0099_task.puls");
    touch(&dicom, "5555_Study/5555_rest.puls");
    let mapping_file = write_mapping(dir.path(), mapping);
    let options = PhysioOptions::new(&dicom, ArchiveLayout::new(&bids, "01"), mapping_file);
    (dir, options)
}

const MAPPING: &str = "RawID,AnonymizedID\n0012,A1\n0099,A2\n";

#[test]
fn dry_run_lists_candidates_without_touching_archive() {
    let (_dir, options) = fixture(MAPPING);

    let scan = run_physio_dry_run(&options).expect("dry run");

    assert_eq!(scan.candidates.len(), 2);
    assert_eq!(scan.candidates[0].anonymized_id, "A1");
    assert_eq!(scan.candidates[0].raw_id, "0012");
    assert_eq!(
        scan.candidates[0].target_dir,
        options.layout.root().join("sub-A1/ses-01/func")
    );
    assert_eq!(scan.candidates[1].anonymized_id, "A2");
    assert_eq!(scan.unmatched.len(), 1);
    assert!(scan.unmatched[0].ends_with("5555_rest.puls"));
    assert_eq!(scan.total_files(), 3);
    assert!(!options.layout.root().exists());
}

#[test]
fn dry_run_is_repeatable() {
    let (_dir, options) = fixture(MAPPING);

    let first = run_physio_dry_run(&options).expect("first dry run");
    let second = run_physio_dry_run(&options).expect("second dry run");

    assert_eq!(first, second);
}

#[test]
fn missing_anonymized_column_fails_before_walking() {
    let (_dir, mut options) = fixture("RawID,Pseudonym\n0012,A1\n");
    options.dicom_dir = options.dicom_dir.join("does-not-exist");

    let error = run_physio_dry_run(&options).expect_err("schema error");
    assert!(error.is_schema_error());

    let mut runner = RecordingRunner::new();
    let error = run_physio_conversion(&options, &mut runner).expect_err("schema error");
    assert!(error.is_schema_error());
    assert!(runner.invocations.is_empty());
}

#[test]
fn real_run_converts_inside_func_dir_without_changing_cwd() {
    let (_dir, options) = fixture(MAPPING);
    let cwd_before = std::env::current_dir().expect("cwd");
    let mut runner = RecordingRunner::new();

    let report = run_physio_conversion(&options, &mut runner).expect("physio run");

    assert_eq!(std::env::current_dir().expect("cwd"), cwd_before);
    assert_eq!(report.converted_count(), 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.error_count(), 0);

    let calls = runner.calls_to("physio2bidsphysio");
    assert_eq!(calls.len(), 2);
    let func_dir = options.layout.root().join("sub-A1/ses-01/func");
    assert!(func_dir.is_dir());
    assert_eq!(calls[0].current_dir.as_deref(), Some(func_dir.as_path()));
    assert_eq!(arg_after(calls[0], "-b").as_deref(), Some("sub-A1"));
    assert!(
        arg_after(calls[0], "-i")
            .expect("input arg")
            .ends_with("0012_rest.puls")
    );
}

#[test]
fn relative_input_root_reaches_the_child_as_absolute_paths() {
    let (dir, mut options) = relative_fixture(MAPPING);
    options.tools.physio = dir.path().join("bin/physio2bidsphysio");
    let mut runner = RecordingRunner::new();

    let report = run_physio_conversion(&options, &mut runner).expect("physio run");

    assert_eq!(report.converted_count(), 2);
    let call = &runner.invocations[0];
    assert!(call.program.is_absolute());
    let cwd = call.current_dir.as_deref().expect("child cwd");
    assert!(cwd.is_absolute());
    assert!(cwd.ends_with("sub-A1/ses-01/func"));
    let input = PathBuf::from(arg_after(call, "-i").expect("input arg"));
    assert!(input.is_absolute());
    // Resolved from inside the child's working directory.
    assert!(cwd.join(&input).is_file());
}

#[cfg(unix)]
#[test]
fn relative_input_root_converts_with_process_runner() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, mut options) = relative_fixture(MAPPING);
    // Stand-in converter that fails unless its -i argument names a file.
    let script = dir.path().join("bin/fake-physio");
    fs::create_dir_all(dir.path().join("bin")).expect("create bin");
    fs::write(&script, "#!/bin/sh\ntest -f \"$2\"\n").expect("write script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    options.tools.physio = script;

    let report = run_physio_conversion(&options, &mut ProcessRunner).expect("physio run");

    assert_eq!(report.error_count(), 0, "{:?}", report.files);
    assert_eq!(report.converted_count(), 2);
}

#[test]
fn conversion_errors_are_counted_not_fatal() {
    let (_dir, options) = fixture(MAPPING);
    let mut runner = RecordingRunner::new().failing_on_arg("0012_rest.puls");

    let report = run_physio_conversion(&options, &mut runner).expect("physio run");

    assert_eq!(report.error_count(), 1);
    assert_eq!(report.converted_count(), 1);
    assert!(report.files[0].outcome.is_failed());
    assert_eq!(report.files[1].outcome, StepOutcome::Completed);
    assert!(report.has_failures());
}

#[test]
fn rows_without_anonymized_id_are_skipped() {
    let (_dir, options) = fixture("RawID,AnonymizedID\n0012,\n0099,A2\n");

    let scan = run_physio_dry_run(&options).expect("dry run");

    assert_eq!(scan.candidates.len(), 1);
    assert_eq!(scan.missing_anonymized.len(), 1);
    assert_eq!(scan.skipped_count(), 2);
}

#[test]
fn unreadable_target_is_reported_per_file() {
    let (_dir, options) = fixture(MAPPING);
    // A regular file where the subject directory should be blocks create_dir_all.
    fs::create_dir_all(options.layout.root()).expect("create bids root");
    fs::write(options.layout.root().join("sub-A1"), b"not a dir").expect("write blocker");
    let mut runner = RecordingRunner::new();

    let report = run_physio_conversion(&options, &mut runner).expect("physio run");

    assert!(report.files[0].outcome.is_failed());
    assert_eq!(report.files[1].outcome, StepOutcome::Completed);
    assert_eq!(runner.calls_to("physio2bidsphysio").len(), 1);
}
