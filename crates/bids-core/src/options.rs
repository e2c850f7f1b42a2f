//! Options for the conversion and physio passes.

use std::path::PathBuf;

use bids_model::{ArchiveLayout, ColumnOrder, MatchStrategy};

use crate::tools::ToolPaths;

/// Anatomical volumes handed to `pydeface` end with this suffix.
pub const DEFAULT_T1W_SUFFIX: &str = "_T1w.nii.gz";
/// Physiological recordings end with this suffix.
pub const DEFAULT_PHYSIO_EXTENSION: &str = ".puls";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchingOptions {
    pub strategy: MatchStrategy,
    /// Treat names matching several rows as unmatched instead of taking
    /// the first row.
    pub reject_ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaceOptions {
    pub enabled: bool,
    pub suffix: String,
}

impl Default for DefaceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            suffix: DEFAULT_T1W_SUFFIX.to_string(),
        }
    }
}

/// Inputs of the main conversion pass.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub dicom_dir: PathBuf,
    pub layout: ArchiveLayout,
    pub dcm2bids_config: PathBuf,
    pub mapping_file: PathBuf,
    pub column_order: ColumnOrder,
    pub matching: MatchingOptions,
    pub deface: DefaceOptions,
    pub physio_extension: String,
    pub tools: ToolPaths,
}

impl ConvertOptions {
    pub fn new(
        dicom_dir: impl Into<PathBuf>,
        layout: ArchiveLayout,
        dcm2bids_config: impl Into<PathBuf>,
        mapping_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dicom_dir: dicom_dir.into(),
            layout,
            dcm2bids_config: dcm2bids_config.into(),
            mapping_file: mapping_file.into(),
            column_order: ColumnOrder::default(),
            matching: MatchingOptions::default(),
            deface: DefaceOptions::default(),
            physio_extension: DEFAULT_PHYSIO_EXTENSION.to_string(),
            tools: ToolPaths::default(),
        }
    }
}

/// Inputs of the physio pass (dry run or real run).
#[derive(Debug, Clone)]
pub struct PhysioOptions {
    pub dicom_dir: PathBuf,
    pub layout: ArchiveLayout,
    pub mapping_file: PathBuf,
    pub matching: MatchingOptions,
    pub extension: String,
    pub tools: ToolPaths,
}

impl PhysioOptions {
    pub fn new(
        dicom_dir: impl Into<PathBuf>,
        layout: ArchiveLayout,
        mapping_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dicom_dir: dicom_dir.into(),
            layout,
            mapping_file: mapping_file.into(),
            matching: MatchingOptions::default(),
            extension: DEFAULT_PHYSIO_EXTENSION.to_string(),
            tools: ToolPaths::default(),
        }
    }
}
