//! Pull-based job polling engine.
//!
//! Drives a single job from its current status to a terminal one by
//! re-querying the status endpoint on a timer. The pacing always comes
//! from the most recent server response, so the server can signal
//! backoff without a client change.

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use tracing::{debug, warn};

use clipnote_extract_client::{ExtractClient, ExtractError};
use clipnote_models::{JobId, ProcessingJob};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};

/// Progress notification emitted while polling.
#[derive(Debug)]
pub enum PollUpdate<'a> {
    /// A fresh status snapshot arrived
    Status(&'a ProcessingJob),
    /// The soft wall-clock ceiling passed; polling continues
    TakingLongerThanExpected,
    /// A poll attempt failed; the job itself is not affected
    TransientFailure { consecutive: u32 },
}

/// Polls one job until it reaches a terminal status.
pub struct JobPoller {
    client: Arc<ExtractClient>,
    config: IngestConfig,
}

impl JobPoller {
    /// Create a new poller.
    pub fn new(client: Arc<ExtractClient>, config: IngestConfig) -> Self {
        Self { client, config }
    }

    /// Poll until the job reaches a terminal status.
    ///
    /// One request is outstanding at a time: the next poll is only
    /// issued after the previous response (or failure) has been fully
    /// processed. `seed_interval_ms` paces the first poll; afterwards
    /// each response's `poll_interval_ms` paces the next one.
    ///
    /// Consecutive transport failures up to the configured bound are
    /// tolerated and reported through `observe`; one more ends the loop
    /// with [`IngestError::ConnectivityLost`]. The job is never marked
    /// failed locally on transport errors, the authoritative status
    /// lives server-side. An auth failure ends the loop immediately:
    /// retrying cannot help until the user signs in again.
    pub async fn poll_until_terminal<F>(
        &self,
        job_id: &JobId,
        seed_interval_ms: u64,
        mut observe: F,
    ) -> IngestResult<ProcessingJob>
    where
        F: FnMut(PollUpdate<'_>),
    {
        let started = Instant::now();
        let mut warned_slow = false;
        let mut consecutive_failures = 0u32;
        let mut interval = self.config.effective_poll_interval(seed_interval_ms);

        debug!(job_id = %job_id, interval_ms = interval.as_millis() as u64, "Starting poll loop");

        loop {
            tokio::time::sleep(interval).await;

            if !warned_slow && started.elapsed() >= self.config.soft_deadline {
                warned_slow = true;
                observe(PollUpdate::TakingLongerThanExpected);
            }

            match self.client.job_status(job_id).await {
                Ok(job) => {
                    consecutive_failures = 0;
                    observe(PollUpdate::Status(&job));

                    if job.is_terminal() {
                        debug!(job_id = %job_id, status = %job.status, "Job reached terminal status");
                        return Ok(job);
                    }

                    interval = self.config.effective_poll_interval(job.poll_interval_ms);
                }
                Err(e @ ExtractError::Unauthorized(_)) => {
                    return Err(IngestError::Extract(e));
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        job_id = %job_id,
                        consecutive = consecutive_failures,
                        "Poll attempt failed: {}",
                        e
                    );

                    if consecutive_failures > self.config.max_consecutive_poll_failures {
                        counter!("ingest_connectivity_lost_total").increment(1);
                        return Err(IngestError::ConnectivityLost {
                            job_id: job_id.to_string(),
                            attempts: consecutive_failures,
                        });
                    }

                    observe(PollUpdate::TransientFailure {
                        consecutive: consecutive_failures,
                    });
                }
            }
        }
    }
}
