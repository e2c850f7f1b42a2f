//! CLI library components for the DICOM-to-BIDS batch converter.

pub mod config;
pub mod logging;
pub mod report;
pub mod summary;
