//! Main conversion pass.
//!
//! For every subject folder under the input root:
//! 1. **Match**: resolve the folder name to a mapping row
//! 2. **Archive**: run `dcm2bids` unless the session directory already has content
//! 3. **Deface**: run `pydeface` on each anatomical volume
//! 4. **Physio check**: note whether a waveform file exists for the subject
//!
//! Each step reports a [`StepOutcome`]; a failing step never stops the
//! other steps or the remaining subjects.

use std::path::{Path, PathBuf};
use std::time::Instant;

use bids_ingest::{
    MappingColumns, first_file_with_suffix, list_files_with_suffix, list_subject_folders,
    load_mapping_table, match_subject_folder,
};
use bids_model::{BatchReport, MappingRow, MatchOutcome, StepOutcome, SubjectFolder, SubjectReport};
use tracing::{error, info, info_span, warn};

use crate::error::Result;
use crate::options::{ConvertOptions, MatchingOptions};
use crate::tools::{ToolRunner, dcm2bids_invocation, pydeface_invocation};

/// Run the conversion pass over every folder in `options.dicom_dir`.
///
/// # Errors
///
/// Only a mapping table that cannot be loaded or a missing input root
/// abort the pass.
pub fn run_conversion(options: &ConvertOptions, runner: &mut dyn ToolRunner) -> Result<BatchReport> {
    let table = load_mapping_table(
        &options.mapping_file,
        MappingColumns::Positional(options.column_order),
    )?;
    info!(
        mapping_file = %options.mapping_file.display(),
        rows = table.len(),
        "loaded mapping table"
    );
    let folders = list_subject_folders(&options.dicom_dir)?;
    info!(
        dicom_dir = %options.dicom_dir.display(),
        folder_count = folders.len(),
        "discovered subject folders"
    );

    let start = Instant::now();
    let mut report = BatchReport::new(options.layout.session.clone());
    for folder in &folders {
        let Some((row, ambiguous_with)) = resolve_subject(folder, table.rows(), options.matching)
        else {
            report.unmatched.push(folder.name.clone());
            continue;
        };
        let mut subject = convert_subject(folder, row, options, runner);
        subject.ambiguous_with = ambiguous_with;
        report.subjects.push(subject);
    }

    info!(
        converted = report.converted_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        not_found = report.not_found_count(),
        missing_physio = report.missing_physio_count(),
        duration_ms = start.elapsed().as_millis(),
        "conversion pass complete"
    );
    Ok(report)
}

/// Resolve a folder to its row, logging the reason when it is skipped.
fn resolve_subject<'a>(
    folder: &SubjectFolder,
    rows: &'a [MappingRow],
    matching: MatchingOptions,
) -> Option<(&'a MappingRow, Vec<String>)> {
    let outcome = match_subject_folder(&folder.name, rows, matching.strategy);
    let alternatives = outcome.alternatives();
    let row = match outcome {
        MatchOutcome::Unmatched => {
            warn!(folder = %folder.name, "no mapping found, skipping");
            return None;
        }
        MatchOutcome::Ambiguous { chosen, .. } if matching.reject_ambiguous => {
            warn!(
                folder = %folder.name,
                raw_id = %chosen.raw_id,
                also = ?alternatives,
                "ambiguous mapping rejected, skipping"
            );
            return None;
        }
        MatchOutcome::Ambiguous { chosen, .. } => {
            warn!(
                folder = %folder.name,
                raw_id = %chosen.raw_id,
                also = ?alternatives,
                "folder matches several mapping rows, using the first"
            );
            chosen
        }
        MatchOutcome::Unique(row) => row,
    };
    if !row.has_anonymized_id() {
        warn!(
            folder = %folder.name,
            raw_id = %row.raw_id,
            row = row.row_number,
            "mapping row has no anonymized id, skipping"
        );
        return None;
    }
    Some((row, alternatives))
}

/// Run the three per-subject steps for one matched folder.
pub fn convert_subject(
    folder: &SubjectFolder,
    row: &MappingRow,
    options: &ConvertOptions,
    runner: &mut dyn ToolRunner,
) -> SubjectReport {
    let anon_id = row.anonymized_id.as_str();
    let span = info_span!("subject", raw_id = %row.raw_id, anon_id = %anon_id);
    let _guard = span.enter();
    info!(
        folder = %folder.name,
        assigned_id = %anon_id,
        matched_raw_id = %row.raw_id,
        "found match"
    );

    let archive = run_archive_step(&folder.path, anon_id, options, runner);
    let (deface, defaced_files) = run_deface_step(anon_id, options, runner);
    let physio_present = check_physio_presence(&folder.path, &options.physio_extension).is_some();

    SubjectReport {
        folder: folder.name.clone(),
        raw_id: row.raw_id.clone(),
        anonymized_id: anon_id.to_string(),
        ambiguous_with: Vec::new(),
        archive,
        deface,
        defaced_files,
        physio_present,
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Convert one subject with `dcm2bids` unless its session directory already
/// exists and is non-empty.
pub fn run_archive_step(
    subject_dir: &Path,
    anon_id: &str,
    options: &ConvertOptions,
    runner: &mut dyn ToolRunner,
) -> StepOutcome {
    let session_dir = options.layout.session_dir(anon_id);
    if is_non_empty_dir(&session_dir) {
        info!(
            session = %options.layout.session,
            output = %session_dir.display(),
            "already converted, skipping dcm2bids"
        );
        return StepOutcome::skipped("already converted");
    }

    let invocation = dcm2bids_invocation(
        &options.tools,
        subject_dir,
        anon_id,
        &options.layout,
        &options.dcm2bids_config,
    );
    info!(command = %invocation.command_line(), "running dcm2bids");
    match runner.run(&invocation) {
        Ok(()) => {
            info!(session = %options.layout.session, "conversion complete");
            StepOutcome::Completed
        }
        Err(e) => {
            error!(session = %options.layout.session, error = %e, "conversion failed");
            StepOutcome::failed(e.to_string())
        }
    }
}

/// Deface every anatomical volume of one subject.
///
/// Returns the step outcome and the number of volumes defaced successfully.
/// A failing volume does not stop the remaining ones.
pub fn run_deface_step(
    anon_id: &str,
    options: &ConvertOptions,
    runner: &mut dyn ToolRunner,
) -> (StepOutcome, usize) {
    if !options.deface.enabled {
        return (StepOutcome::skipped("defacing disabled"), 0);
    }
    let anat_dir = options.layout.anat_dir(anon_id);
    if !anat_dir.is_dir() {
        warn!(anat_dir = %anat_dir.display(), "no anat directory, skipping defacing");
        return (StepOutcome::skipped("no anat directory"), 0);
    }
    let volumes = match list_files_with_suffix(&anat_dir, &options.deface.suffix) {
        Ok(volumes) => volumes,
        Err(e) => {
            error!(error = %e, "cannot list anatomical volumes");
            return (StepOutcome::failed(e.to_string()), 0);
        }
    };
    if volumes.is_empty() {
        warn!(
            anat_dir = %anat_dir.display(),
            suffix = %options.deface.suffix,
            "no anatomical volumes to deface"
        );
        return (StepOutcome::skipped("no anatomical volumes"), 0);
    }

    let mut defaced = 0usize;
    let mut failures = Vec::new();
    for volume in &volumes {
        let invocation = pydeface_invocation(&options.tools, volume);
        info!(volume = %volume.display(), "defacing");
        match runner.run(&invocation) {
            Ok(()) => defaced += 1,
            Err(e) => {
                error!(volume = %volume.display(), error = %e, "defacing failed");
                failures.push(format!("{}: {e}", file_label(volume)));
            }
        }
    }
    if failures.is_empty() {
        (StepOutcome::Completed, defaced)
    } else {
        (StepOutcome::failed(failures.join("; ")), defaced)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Look for a waveform file anywhere below `subject_dir`, stopping at the
/// first one.
pub fn check_physio_presence(subject_dir: &Path, extension: &str) -> Option<PathBuf> {
    let found = first_file_with_suffix(subject_dir, extension);
    match &found {
        Some(path) => info!(path = %path.display(), "physio file found"),
        None => warn!(
            subject_dir = %subject_dir.display(),
            extension,
            "no physio file found"
        ),
    }
    found
}
