//! Physio pass: locate waveform recordings and extract them into `func/`.
//!
//! The mapping table is loaded in named mode here, so a sheet without
//! `RawID`/`AnonymizedID` headers fails before the input tree is walked.

use std::path::Path;

use bids_ingest::{
    MappingColumns, MappingTable, find_files_with_suffix, load_mapping_table, match_physio_file,
};
use bids_model::{
    MappingRow, MatchOutcome, PhysioCandidate, PhysioFileOutcome, PhysioRunReport, PhysioScan,
    StepOutcome,
};
use tracing::{error, info, info_span, warn};

use crate::error::Result;
use crate::options::PhysioOptions;
use crate::tools::{ToolRunner, physio_invocation};

/// Load the mapping table, requiring the `RawID` and `AnonymizedID` headers.
///
/// # Errors
///
/// Returns a schema error if either header is missing.
pub fn load_physio_mapping(path: &Path) -> Result<MappingTable> {
    let table = load_mapping_table(path, MappingColumns::Named)?;
    info!(
        mapping_file = %path.display(),
        rows = table.len(),
        "loaded mapping for physio pass"
    );
    Ok(table)
}

/// Walk the input tree and resolve every waveform file to its subject.
///
/// The walk is sorted, so scanning an unchanged tree twice yields the same
/// candidates in the same order.
///
/// # Errors
///
/// Fails only if the input root does not exist.
pub fn scan_physio(options: &PhysioOptions, rows: &[MappingRow]) -> Result<PhysioScan> {
    let files = find_files_with_suffix(&options.dicom_dir, &options.extension)?;
    let mut scan = PhysioScan::default();
    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = match_physio_file(&file_name, rows, options.matching.strategy);
        let alternatives = outcome.alternatives();
        let row = match outcome {
            MatchOutcome::Unmatched => {
                warn!(file = %file_name, "no matching raw id for physio file, skipping");
                scan.unmatched.push(path);
                continue;
            }
            MatchOutcome::Ambiguous { chosen, .. } if options.matching.reject_ambiguous => {
                warn!(
                    file = %file_name,
                    raw_id = %chosen.raw_id,
                    also = ?alternatives,
                    "ambiguous physio file rejected, skipping"
                );
                scan.unmatched.push(path);
                continue;
            }
            MatchOutcome::Ambiguous { chosen, .. } => {
                warn!(
                    file = %file_name,
                    raw_id = %chosen.raw_id,
                    also = ?alternatives,
                    "physio file matches several mapping rows, using the first"
                );
                chosen
            }
            MatchOutcome::Unique(row) => row,
        };
        if !row.has_anonymized_id() {
            warn!(
                file = %file_name,
                raw_id = %row.raw_id,
                "no anonymized id for raw id, skipping"
            );
            scan.missing_anonymized.push(path);
            continue;
        }
        scan.candidates.push(PhysioCandidate {
            raw_id: row.raw_id.clone(),
            anonymized_id: row.anonymized_id.clone(),
            target_dir: options.layout.func_dir(&row.anonymized_id),
            source_path: path,
        });
    }
    Ok(scan)
}

/// Report what a real run would convert, without touching the archive.
///
/// # Errors
///
/// Fails on a mapping schema error (before any walk) or a missing input root.
pub fn run_physio_dry_run(options: &PhysioOptions) -> Result<PhysioScan> {
    let table = load_physio_mapping(&options.mapping_file)?;
    let scan = scan_physio(options, table.rows())?;
    for candidate in &scan.candidates {
        info!(
            file = %candidate.file_name(),
            raw_id = %candidate.raw_id,
            anon_id = %candidate.anonymized_id,
            target_dir = %candidate.target_dir.display(),
            "would convert"
        );
    }
    info!(
        candidates = scan.candidates.len(),
        skipped = scan.skipped_count(),
        "dry run complete, no conversions executed"
    );
    Ok(scan)
}

/// Convert every matched waveform file.
///
/// # Errors
///
/// Fails on a mapping schema error or a missing input root; individual
/// conversion failures are counted in the report instead.
pub fn run_physio_conversion(
    options: &PhysioOptions,
    runner: &mut dyn ToolRunner,
) -> Result<PhysioRunReport> {
    let table = load_physio_mapping(&options.mapping_file)?;
    let scan = scan_physio(options, table.rows())?;
    let mut report = PhysioRunReport {
        files: Vec::with_capacity(scan.candidates.len()),
        skipped: scan.skipped_count(),
    };
    for candidate in scan.candidates {
        let outcome = convert_physio_file(&candidate, options, runner);
        report.files.push(PhysioFileOutcome { candidate, outcome });
    }
    info!(
        converted = report.converted_count(),
        skipped = report.skipped,
        errors = report.error_count(),
        "physio pass complete"
    );
    Ok(report)
}

/// Create the target `func/` directory and run the waveform converter in it.
pub fn convert_physio_file(
    candidate: &PhysioCandidate,
    options: &PhysioOptions,
    runner: &mut dyn ToolRunner,
) -> StepOutcome {
    let span = info_span!(
        "physio",
        raw_id = %candidate.raw_id,
        anon_id = %candidate.anonymized_id
    );
    let _guard = span.enter();

    if let Err(e) = std::fs::create_dir_all(&candidate.target_dir) {
        error!(
            target_dir = %candidate.target_dir.display(),
            error = %e,
            "cannot create target directory"
        );
        return StepOutcome::failed(format!(
            "cannot create {}: {e}",
            candidate.target_dir.display()
        ));
    }

    let invocation = match physio_invocation(
        &options.tools,
        &candidate.source_path,
        &candidate.anonymized_id,
        &candidate.target_dir,
    ) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!(error = %e, "cannot resolve physio paths");
            return StepOutcome::failed(format!("cannot resolve paths: {e}"));
        }
    };
    info!(
        command = %invocation.command_line(),
        cwd = ?invocation.current_dir,
        "running physio2bidsphysio"
    );
    match runner.run(&invocation) {
        Ok(()) => {
            info!(source = %candidate.source_path.display(), "converted");
            StepOutcome::Completed
        }
        Err(e) => {
            error!(
                source = %candidate.source_path.display(),
                error = %e,
                "physio conversion failed"
            );
            StepOutcome::failed(e.to_string())
        }
    }
}
