//! Observable orchestration state.
//!
//! The orchestrator publishes an [`IngestSnapshot`] over a watch channel
//! after every transition; the UI renders whatever the latest snapshot
//! says. Snapshots are plain values, so a late subscriber sees the
//! current state immediately.

use serde::Serialize;

use clipnote_extract_client::ExtractError;
use clipnote_models::{
    JobError, JobId, Platform, ProcessingStatus, RecommendedAction, ResourceId,
};

/// Phase of the ingestion flow for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    /// Nothing started yet
    Idle,
    /// Recovery lookup in flight
    Recovering,
    /// Submission request in flight
    Submitting,
    /// Watching a job progress
    Polling,
    /// A prior job already produced this resource
    AlreadyProcessed,
    /// Job completed and the resource was saved
    Completed,
    /// Job completed but saving the resource failed
    SaveFailed,
    /// Job failed, input unsupported, or submission rejected
    Failed,
    /// Too many consecutive poll failures; job may still be running
    ConnectivityLost,
}

impl IngestPhase {
    /// Phases after which the flow makes no further progress on its own.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            IngestPhase::AlreadyProcessed
                | IngestPhase::Completed
                | IngestPhase::SaveFailed
                | IngestPhase::Failed
                | IngestPhase::ConnectivityLost
        )
    }
}

/// User-facing failure: the message to show and the next step to offer.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub message: String,
    pub action: RecommendedAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_suggestion: Option<String>,
}

impl IngestFailure {
    /// Failure surfaced verbatim from a terminal job error.
    pub fn from_job_error(error: &JobError) -> Self {
        Self {
            message: error.message.clone(),
            action: error.recommended_action(),
            retry_after_ms: error.retry_after_ms,
            fallback_suggestion: error.fallback_suggestion.clone(),
        }
    }

    /// Failure derived from a client-side error.
    pub fn from_extract_error(error: &ExtractError) -> Self {
        match error {
            ExtractError::Api(job_error) => Self::from_job_error(job_error),
            ExtractError::Unauthorized(_) => Self {
                message: "You need to sign in again before processing videos".to_string(),
                action: RecommendedAction::Retry,
                retry_after_ms: None,
                fallback_suggestion: None,
            },
            ExtractError::RateLimited { retry_after_ms } => Self {
                message: "The extraction service is busy".to_string(),
                action: RecommendedAction::WaitAndRetry,
                retry_after_ms: *retry_after_ms,
                fallback_suggestion: None,
            },
            other => Self {
                message: format!("Could not reach the extraction service: {}", other),
                action: RecommendedAction::Retry,
                retry_after_ms: None,
                fallback_suggestion: None,
            },
        }
    }
}

/// Point-in-time view of one URL's ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSnapshot {
    pub phase: IngestPhase,
    pub raw_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProcessingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub progress: u8,
    /// Non-fatal, user-visible note ("already underway", "taking longer
    /// than expected", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IngestFailure>,
    /// Set once the resource has been created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
}

impl IngestSnapshot {
    /// Initial snapshot for a URL about to be processed.
    pub fn idle(raw_url: &str, normalized_url: Option<String>, platform: Option<Platform>) -> Self {
        Self {
            phase: IngestPhase::Idle,
            raw_url: raw_url.to_string(),
            normalized_url,
            platform,
            job_id: None,
            status: None,
            current_step: None,
            progress: 0,
            notice: None,
            error: None,
            resource_id: None,
        }
    }

    /// Snapshot for input rejected before any network call.
    pub fn unsupported(raw_url: &str) -> Self {
        let mut snapshot = Self::idle(raw_url, None, None);
        snapshot.phase = IngestPhase::Failed;
        snapshot.error = Some(IngestFailure {
            message: "This doesn't look like a supported TikTok, YouTube Shorts, or Instagram Reel link".to_string(),
            action: RecommendedAction::FixInput,
            retry_after_ms: None,
            fallback_suggestion: None,
        });
        snapshot
    }
}

/// Session-local bookkeeping for one normalized URL.
///
/// Never persisted; its only job is to make one-shot transitions
/// explicit. `auto_submit_attempted` goes false→true exactly once per
/// session regardless of outcome, which is what guarantees at most one
/// automatic submission even under re-entry.
#[derive(Debug, Clone, Default)]
pub struct LocalOrchestrationState {
    pub job_id: Option<JobId>,
    pub is_polling: bool,
    pub recovery_checked: bool,
    pub auto_submit_attempted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_models::ErrorCode;

    #[test]
    fn test_settled_phases() {
        assert!(!IngestPhase::Idle.is_settled());
        assert!(!IngestPhase::Recovering.is_settled());
        assert!(!IngestPhase::Submitting.is_settled());
        assert!(!IngestPhase::Polling.is_settled());
        assert!(IngestPhase::AlreadyProcessed.is_settled());
        assert!(IngestPhase::Completed.is_settled());
        assert!(IngestPhase::SaveFailed.is_settled());
        assert!(IngestPhase::Failed.is_settled());
        assert!(IngestPhase::ConnectivityLost.is_settled());
    }

    #[test]
    fn test_failure_from_job_error_keeps_message_verbatim() {
        let failure = IngestFailure::from_job_error(&JobError {
            code: ErrorCode::PrivacyBlocked,
            message: "This video is private".to_string(),
            details: None,
            retry_after_ms: None,
            fallback_suggestion: None,
        });

        assert_eq!(failure.message, "This video is private");
        assert_eq!(failure.action, RecommendedAction::CreateManually);
    }

    #[test]
    fn test_unsupported_snapshot() {
        let snapshot = IngestSnapshot::unsupported("not a url");
        assert_eq!(snapshot.phase, IngestPhase::Failed);
        assert_eq!(
            snapshot.error.unwrap().action,
            RecommendedAction::FixInput
        );
    }
}
