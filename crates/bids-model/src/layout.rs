//! BIDS archive path layout: `<root>/sub-<anon>/ses-<session>/<datatype>/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Datatype directory holding anatomical volumes.
pub const ANAT_DIR: &str = "anat";
/// Datatype directory holding functional data and physio recordings.
pub const FUNC_DIR: &str = "func";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLayout {
    pub root: PathBuf,
    pub session: String,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>, session: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            session: session.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `sub-<anon>`, also used as the physio output basename.
    pub fn subject_label(anonymized_id: &str) -> String {
        format!("sub-{anonymized_id}")
    }

    pub fn session_label(&self) -> String {
        format!("ses-{}", self.session)
    }

    pub fn session_dir(&self, anonymized_id: &str) -> PathBuf {
        self.root
            .join(Self::subject_label(anonymized_id))
            .join(self.session_label())
    }

    pub fn anat_dir(&self, anonymized_id: &str) -> PathBuf {
        self.session_dir(anonymized_id).join(ANAT_DIR)
    }

    pub fn func_dir(&self, anonymized_id: &str) -> PathBuf {
        self.session_dir(anonymized_id).join(FUNC_DIR)
    }
}
