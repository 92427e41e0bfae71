//! Extraction service wire types.
//!
//! The service speaks camelCase JSON and discriminates every response on
//! a boolean `success` field. Payloads are decoded into [`ApiOutcome`],
//! a tagged sum, so a failure body can never be mistaken for job data.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use clipnote_models::{
    ErrorCode, JobError, JobId, ProcessingJob, ProcessingStatus, ShortFormMetadata,
};

use crate::error::ExtractError;

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /short-form/process`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Normalized URL to process
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ProcessOptions>,
}

/// Optional processing knobs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOptions {
    /// Ask the pipeline to also extract captions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_transcript: Option<bool>,
}

// ============================================================================
// Response envelope
// ============================================================================

/// Decoded response: either the typed success payload or the service's
/// structured error.
#[derive(Debug)]
pub enum ApiOutcome<T> {
    Success(T),
    Failure(JobError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureEnvelope {
    #[allow(dead_code)]
    success: bool,
    error: ErrorPayload,
}

/// Error object inside a failure envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub retry_after_ms: Option<u64>,
    #[serde(default)]
    pub fallback_suggestion: Option<String>,
}

impl From<ErrorPayload> for JobError {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            code: payload.code,
            message: payload.message,
            details: payload.details,
            retry_after_ms: payload.retry_after_ms,
            fallback_suggestion: payload.fallback_suggestion,
        }
    }
}

/// Decode a response body, dispatching on the `success` discriminator.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<ApiOutcome<T>, ExtractError> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    match value.get("success").and_then(|v| v.as_bool()) {
        Some(true) => Ok(ApiOutcome::Success(serde_json::from_value(value)?)),
        Some(false) => {
            let envelope: FailureEnvelope = serde_json::from_value(value)?;
            Ok(ApiOutcome::Failure(envelope.error.into()))
        }
        None => Err(ExtractError::InvalidResponse(
            "response is missing the success discriminator".to_string(),
        )),
    }
}

// ============================================================================
// Success payloads
// ============================================================================

/// Success body of `POST /short-form/process`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAccepted {
    pub job_id: String,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub estimated_time_ms: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the caller gets back from a submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The sole handle for all subsequent polling
    pub job_id: JobId,
    pub status: ProcessingStatus,
    pub poll_interval_ms: u64,
    pub estimated_time_ms: Option<u64>,
    pub message: Option<String>,
}

impl From<ProcessAccepted> for SubmitReceipt {
    fn from(accepted: ProcessAccepted) -> Self {
        Self {
            job_id: JobId::from(accepted.job_id),
            status: accepted.status,
            poll_interval_ms: accepted.poll_interval_ms,
            estimated_time_ms: accepted.estimated_time_ms,
            message: accepted.message,
        }
    }
}

/// Success body of `GET /short-form/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub job_id: String,
    #[serde(default)]
    pub normalized_url: Option<String>,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub metadata: Option<MetadataPayload>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorPayload>,
    #[serde(default)]
    pub poll_interval_ms: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Extracted metadata as the service serializes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "creator")]
    pub creator_name: String,
    #[serde(default)]
    pub creator_handle: Option<String>,
    #[serde(alias = "duration")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<MetadataPayload> for ShortFormMetadata {
    fn from(payload: MetadataPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            creator_name: payload.creator_name,
            creator_handle: payload.creator_handle,
            duration_seconds: payload.duration_seconds,
            hashtags: payload.hashtags,
            thumbnail_url: payload.thumbnail_url,
            published_at: payload.published_at,
        }
    }
}

impl From<StatusPayload> for ProcessingJob {
    fn from(payload: StatusPayload) -> Self {
        Self {
            job_id: JobId::from(payload.job_id),
            normalized_url: payload.normalized_url,
            status: payload.status,
            current_step: payload.current_step,
            progress: payload.progress.unwrap_or(0).min(100),
            metadata: payload.metadata.map(Into::into),
            transcript: payload.transcript,
            error: payload.error.map(Into::into),
            poll_interval_ms: payload.poll_interval_ms,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
            completed_at: payload.completed_at,
        }
    }
}
