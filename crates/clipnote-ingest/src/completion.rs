//! Terminal-state handling.
//!
//! Fires once per job when polling reports a terminal status. The
//! handled-set guard makes duplicate deliveries (a redundant terminal
//! poll response, a re-entrant caller) harmless: the side effect runs at
//! most once per job id.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use metrics::counter;
use tracing::{info, warn};

use clipnote_models::{
    ErrorCode, JobError, NewResource, Platform, ProcessingJob, ProcessingStatus, Resource,
    ResourceMapError,
};
use clipnote_storage::{ResourceClient, StorageError};

use crate::error::{IngestError, IngestResult};

/// What happened when a terminal job was handled.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// Resource created and stored
    Created(Resource),
    /// Extraction succeeded but the save failed; retrying the save is
    /// safe and does not reprocess the video
    SaveFailed {
        resource: NewResource,
        error: StorageError,
    },
    /// The job itself failed; the server's error is authoritative
    Failed(JobError),
    /// This job id was already handled; nothing was done
    AlreadyHandled,
}

/// Handles the one-time side effect of a job reaching a terminal state.
pub struct CompletionHandler {
    store: Arc<ResourceClient>,
    handled: Mutex<HashSet<String>>,
}

impl CompletionHandler {
    /// Create a new completion handler.
    pub fn new(store: Arc<ResourceClient>) -> Self {
        Self {
            store,
            handled: Mutex::new(HashSet::new()),
        }
    }

    /// Handle a job that reached a terminal status.
    ///
    /// Idempotent per job id. A failed save un-claims the job so the
    /// save (and only the save) can be retried by invoking this again
    /// with the same payload.
    pub async fn on_terminal(
        &self,
        job: &ProcessingJob,
        platform: Option<Platform>,
    ) -> IngestResult<CompletionOutcome> {
        if !job.is_terminal() {
            return Err(IngestError::ContractViolation(
                ResourceMapError::NotCompleted(job.job_id.to_string()),
            ));
        }

        if !self.claim(&job.job_id.to_string()) {
            return Ok(CompletionOutcome::AlreadyHandled);
        }

        match job.status {
            ProcessingStatus::Completed => {
                let resource = NewResource::from_completed_job(job, platform)?;

                match self.store.add_resource(&resource).await {
                    Ok(stored) => {
                        counter!("ingest_resources_created_total").increment(1);
                        info!(
                            job_id = %job.job_id,
                            resource_id = %stored.id,
                            "Created resource from completed job"
                        );
                        Ok(CompletionOutcome::Created(stored))
                    }
                    Err(error) => {
                        // No resource exists yet; releasing the claim
                        // lets an explicit retry redo just the save.
                        self.release(&job.job_id.to_string());
                        warn!(
                            job_id = %job.job_id,
                            "Job completed but saving the resource failed: {}",
                            error
                        );
                        Ok(CompletionOutcome::SaveFailed { resource, error })
                    }
                }
            }
            ProcessingStatus::Failed | ProcessingStatus::Unsupported => {
                let error = job.error.clone().unwrap_or_else(|| JobError {
                    code: ErrorCode::InternalError,
                    message: "Processing failed".to_string(),
                    details: None,
                    retry_after_ms: None,
                    fallback_suggestion: None,
                });
                Ok(CompletionOutcome::Failed(error))
            }
            _ => unreachable!("guarded by is_terminal"),
        }
    }

    fn claim(&self, job_id: &str) -> bool {
        self.handled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.to_string())
    }

    fn release(&self, job_id: &str) {
        self.handled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id);
    }
}
