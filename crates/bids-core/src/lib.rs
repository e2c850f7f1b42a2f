//! Conversion orchestration for DICOM-to-BIDS batches.
//!
//! Two independent passes are exposed:
//! - [`run_conversion`]: match each subject folder, run `dcm2bids`, deface
//!   anatomical volumes and check for physio recordings
//! - [`run_physio_dry_run`] / [`run_physio_conversion`]: locate waveform
//!   files and hand them to `physio2bidsphysio`
//!
//! External tools are invoked through the [`ToolRunner`] trait so that
//! every invocation is explicit data ([`ToolInvocation`]).

pub mod error;
pub mod options;
pub mod orchestrator;
pub mod physio;
pub mod tools;

pub use error::{CoreError, Result, ToolError};
pub use options::{
    ConvertOptions, DEFAULT_PHYSIO_EXTENSION, DEFAULT_T1W_SUFFIX, DefaceOptions, MatchingOptions,
    PhysioOptions,
};
pub use orchestrator::{
    check_physio_presence, convert_subject, run_archive_step, run_conversion, run_deface_step,
};
pub use physio::{
    convert_physio_file, load_physio_mapping, run_physio_conversion, run_physio_dry_run,
    scan_physio,
};
pub use tools::{
    ProcessRunner, ToolInvocation, ToolPaths, ToolRunner, dcm2bids_invocation, physio_invocation,
    pydeface_invocation,
};
