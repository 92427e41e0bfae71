//! Orchestrator error types.

use thiserror::Error;

use clipnote_extract_client::ExtractError;
use clipnote_models::ResourceMapError;
use clipnote_storage::StorageError;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("Lost contact with the extraction service after {attempts} consecutive poll failures for job {job_id}")]
    ConnectivityLost { job_id: String, attempts: u32 },

    #[error("Extraction service contract violation: {0}")]
    ContractViolation(#[from] ResourceMapError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
