use bids_ingest::IngestError;
use thiserror::Error;

/// Failure of a single external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited unsuccessfully ({status})")]
    Exit { program: String, status: String },
}

/// Errors that abort a whole pass. Per-subject failures never surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl CoreError {
    /// True when the mapping table itself is malformed.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, CoreError::Ingest(error) if error.is_schema_error())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
