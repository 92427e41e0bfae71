//! Extraction client error types.

use thiserror::Error;

use clipnote_models::JobError;

pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing or invalid credentials: {0}")]
    Unauthorized(String),

    #[error("Extraction service rejected the request: {0}")]
    Api(JobError),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited by extraction service")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Transient failures worth an in-client retry. API-level rejections
    /// are authoritative and never retried here; the orchestrator decides
    /// what to surface for those.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::Network(_)
                | ExtractError::RequestFailed(_)
                | ExtractError::RateLimited { .. }
        )
    }

    /// Server-suggested delay before retrying, when one was provided.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ExtractError::RateLimited { retry_after_ms } => *retry_after_ms,
            ExtractError::Api(job_error) => job_error.retry_after_ms,
            _ => None,
        }
    }
}
