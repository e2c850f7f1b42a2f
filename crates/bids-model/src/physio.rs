use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::outcome::StepOutcome;

/// A waveform file resolved to its subject and archive destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysioCandidate {
    pub raw_id: String,
    pub anonymized_id: String,
    pub source_path: PathBuf,
    /// `<archive>/sub-<anon>/ses-<session>/func`
    pub target_dir: PathBuf,
}

impl PhysioCandidate {
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of walking the input tree for waveform files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysioScan {
    pub candidates: Vec<PhysioCandidate>,
    /// Waveform files whose name contains no raw identifier.
    pub unmatched: Vec<PathBuf>,
    /// Waveform files matched to a row that has no anonymized identifier.
    pub missing_anonymized: Vec<PathBuf>,
}

impl PhysioScan {
    pub fn total_files(&self) -> usize {
        self.candidates.len() + self.skipped_count()
    }

    pub fn skipped_count(&self) -> usize {
        self.unmatched.len() + self.missing_anonymized.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysioFileOutcome {
    pub candidate: PhysioCandidate,
    pub outcome: StepOutcome,
}

/// Counters and per-file outcomes of a real physio conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysioRunReport {
    pub files: Vec<PhysioFileOutcome>,
    pub skipped: usize,
}

impl PhysioRunReport {
    pub fn converted_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.outcome == StepOutcome::Completed)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.outcome.is_failed())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.error_count() > 0
    }
}
