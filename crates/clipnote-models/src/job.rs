//! Processing job read model.
//!
//! The remote extraction service owns the canonical job record; the
//! client holds a cached, possibly-stale copy refreshed by polling. The
//! types here mirror that record and never mutate it locally.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::ShortFormMetadata;

/// Opaque, server-assigned job identifier.
///
/// The client never mints or derives job ids; the only source is a
/// submission or recovery response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from a server-provided string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pipeline status of a processing job.
///
/// Statuses are ordered; `Completed`, `Failed`, and `Unsupported` are
/// terminal and never change again for a given job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Job accepted, waiting for the pipeline to pick it up
    #[default]
    Created,
    /// Platform detection / redirect resolution in progress
    Detecting,
    /// Metadata extraction in progress
    Metadata,
    /// Transcript extraction in progress
    Transcript,
    /// Extraction finished; metadata is available
    Completed,
    /// Extraction failed
    Failed,
    /// The URL or content cannot be processed
    Unsupported,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Created => "created",
            ProcessingStatus::Detecting => "detecting",
            ProcessingStatus::Metadata => "metadata",
            ProcessingStatus::Transcript => "transcript",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Unsupported => "unsupported",
        }
    }

    /// Check if this is a terminal state (no more polling needed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed | ProcessingStatus::Failed | ProcessingStatus::Unsupported
        )
    }

    /// Position in the pipeline, for coarse progress display when the
    /// server does not report a percentage.
    pub fn pipeline_position(&self) -> u8 {
        match self {
            ProcessingStatus::Created => 0,
            ProcessingStatus::Detecting => 1,
            ProcessingStatus::Metadata => 2,
            ProcessingStatus::Transcript => 3,
            ProcessingStatus::Completed
            | ProcessingStatus::Failed
            | ProcessingStatus::Unsupported => 4,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error codes reported by the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidUrl,
    UnsupportedPlatform,
    UnsupportedContent,
    PrivacyBlocked,
    /// The video does not exist (also reported as `job_not_found` by the
    /// status endpoint when queried with a stale id)
    #[serde(alias = "job_not_found")]
    NotFound,
    QuotaExceeded,
    ApiError,
    RateLimited,
    ExtractionFailed,
    TranscriptFailed,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "invalid_url",
            ErrorCode::UnsupportedPlatform => "unsupported_platform",
            ErrorCode::UnsupportedContent => "unsupported_content",
            ErrorCode::PrivacyBlocked => "privacy_blocked",
            ErrorCode::NotFound => "not_found",
            ErrorCode::QuotaExceeded => "quota_exceeded",
            ErrorCode::ApiError => "api_error",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::ExtractionFailed => "extraction_failed",
            ErrorCode::TranscriptFailed => "transcript_failed",
            ErrorCode::InternalError => "internal_error",
        }
    }

    /// The concrete next step to offer the user for this code.
    pub fn recommended_action(&self) -> RecommendedAction {
        match self {
            ErrorCode::InvalidUrl | ErrorCode::UnsupportedPlatform => RecommendedAction::FixInput,
            ErrorCode::UnsupportedContent | ErrorCode::PrivacyBlocked | ErrorCode::NotFound => {
                RecommendedAction::CreateManually
            }
            ErrorCode::QuotaExceeded | ErrorCode::RateLimited => RecommendedAction::WaitAndRetry,
            ErrorCode::ApiError
            | ErrorCode::ExtractionFailed
            | ErrorCode::TranscriptFailed
            | ErrorCode::InternalError => RecommendedAction::Retry,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the user should do next after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Resubmit the same URL
    Retry,
    /// Wait (optionally for a server-stated delay) before resubmitting
    WaitAndRetry,
    /// Give up on automatic extraction, create the resource by hand
    CreateManually,
    /// The input itself is wrong; paste a different URL
    FixInput,
}

/// Structured error attached to a failed or unsupported job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message, surfaced to the user verbatim
    pub message: String,

    /// Optional diagnostic detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Server-suggested delay before retrying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,

    /// Server-suggested manual alternative (e.g. "create the note by hand")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_suggestion: Option<String>,
}

impl JobError {
    /// The next step to offer: a server-provided fallback suggestion
    /// always points at manual creation, otherwise the code decides.
    pub fn recommended_action(&self) -> RecommendedAction {
        if self.fallback_suggestion.is_some() {
            return RecommendedAction::CreateManually;
        }
        self.code.recommended_action()
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Client-side read model of a server-owned processing job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingJob {
    /// Server-assigned job id
    pub job_id: JobId,

    /// Idempotency key the job was created under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_url: Option<String>,

    /// Current pipeline status
    pub status: ProcessingStatus,

    /// Human-readable sub-stage within the status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,

    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Extracted metadata, present iff status is `Completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ShortFormMetadata>,

    /// Extracted transcript, if the platform provided captions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Failure detail, present only in `Failed`/`Unsupported`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,

    /// Server-suggested delay before the next status poll
    pub poll_interval_ms: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProcessingJob {
    /// Check if the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress clamped to 0-100.
    pub fn progress_pct(&self) -> u8 {
        self.progress.min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!ProcessingStatus::Created.is_terminal());
        assert!(!ProcessingStatus::Detecting.is_terminal());
        assert!(!ProcessingStatus::Metadata.is_terminal());
        assert!(!ProcessingStatus::Transcript.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(ProcessingStatus::Unsupported.is_terminal());
    }

    #[test]
    fn test_status_pipeline_order() {
        let order = [
            ProcessingStatus::Created,
            ProcessingStatus::Detecting,
            ProcessingStatus::Metadata,
            ProcessingStatus::Transcript,
            ProcessingStatus::Completed,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].pipeline_position() < pair[1].pipeline_position());
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ProcessingStatus::Detecting).unwrap(),
            "\"detecting\""
        );
        let status: ProcessingStatus = serde_json::from_str("\"unsupported\"").unwrap();
        assert_eq!(status, ProcessingStatus::Unsupported);
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::PrivacyBlocked).unwrap(),
            "\"privacy_blocked\""
        );
        let code: ErrorCode = serde_json::from_str("\"rate_limited\"").unwrap();
        assert_eq!(code, ErrorCode::RateLimited);
    }

    #[test]
    fn test_recommended_actions() {
        assert_eq!(
            ErrorCode::InvalidUrl.recommended_action(),
            RecommendedAction::FixInput
        );
        assert_eq!(
            ErrorCode::RateLimited.recommended_action(),
            RecommendedAction::WaitAndRetry
        );
        assert_eq!(
            ErrorCode::PrivacyBlocked.recommended_action(),
            RecommendedAction::CreateManually
        );
        assert_eq!(
            ErrorCode::ExtractionFailed.recommended_action(),
            RecommendedAction::Retry
        );
    }

    #[test]
    fn test_fallback_suggestion_wins() {
        let error = JobError {
            code: ErrorCode::ExtractionFailed,
            message: "Extraction failed".to_string(),
            details: None,
            retry_after_ms: None,
            fallback_suggestion: Some("Create the note manually".to_string()),
        };
        assert_eq!(error.recommended_action(), RecommendedAction::CreateManually);
    }
}
