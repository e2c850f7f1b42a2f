//! Per-step and per-subject results of the conversion pass.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of one orchestration step for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Completed => "done",
            StepOutcome::Skipped { .. } => "skipped",
            StepOutcome::Failed { .. } => "failed",
        }
    }
}

/// Terminal state of a matched subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    Converted,
    SkippedExisting,
    Failed,
}

impl SubjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Converted => "converted",
            SubjectStatus::SkippedExisting => "skipped",
            SubjectStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything recorded about one matched subject folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub folder: String,
    pub raw_id: String,
    pub anonymized_id: String,
    /// Other raw identifiers that also matched this folder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_with: Vec<String>,
    pub archive: StepOutcome,
    pub deface: StepOutcome,
    pub defaced_files: usize,
    pub physio_present: bool,
}

impl SubjectReport {
    /// Any failed step fails the subject; otherwise an existing archive
    /// output makes it a skip.
    pub fn status(&self) -> SubjectStatus {
        if self.archive.is_failed() || self.deface.is_failed() {
            SubjectStatus::Failed
        } else if self.archive.is_skipped() {
            SubjectStatus::SkippedExisting
        } else {
            SubjectStatus::Converted
        }
    }

    /// Free-text notes for the run report, `None` when there is nothing
    /// noteworthy.
    pub fn notes(&self) -> Option<String> {
        let mut notes = Vec::new();
        if let StepOutcome::Failed { error } = &self.archive {
            notes.push(format!("dcm2bids error: {error}"));
        }
        if let StepOutcome::Failed { error } = &self.deface {
            notes.push(format!("pydeface error: {error}"));
        }
        if !self.ambiguous_with.is_empty() {
            notes.push(format!(
                "ambiguous match, also matched: {}",
                self.ambiguous_with.join(", ")
            ));
        }
        if !self.physio_present {
            notes.push("no physio file".to_string());
        }
        if notes.is_empty() {
            None
        } else {
            Some(notes.join("; "))
        }
    }
}

/// Outcome of a whole conversion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub session: String,
    pub subjects: Vec<SubjectReport>,
    /// Folder names with no mapping row (or rejected as ambiguous).
    pub unmatched: Vec<String>,
}

impl BatchReport {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            ..Self::default()
        }
    }

    fn count_status(&self, status: SubjectStatus) -> usize {
        self.subjects
            .iter()
            .filter(|subject| subject.status() == status)
            .count()
    }

    pub fn converted_count(&self) -> usize {
        self.count_status(SubjectStatus::Converted)
    }

    pub fn skipped_count(&self) -> usize {
        self.count_status(SubjectStatus::SkippedExisting)
    }

    pub fn failed_count(&self) -> usize {
        self.count_status(SubjectStatus::Failed)
    }

    pub fn not_found_count(&self) -> usize {
        self.unmatched.len()
    }

    pub fn missing_physio_count(&self) -> usize {
        self.subjects
            .iter()
            .filter(|subject| !subject.physio_present)
            .count()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.subjects
            .iter()
            .filter(|subject| !subject.ambiguous_with.is_empty())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
