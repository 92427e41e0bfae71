//! Orchestrating controller.
//!
//! Sequences recovery → submission (if needed) → polling → completion for
//! one URL and exposes the whole flow as a stream of snapshots. The two
//! correctness properties enforced here:
//!
//! - Recovery completes (found / not found) before any submission
//!   decision for a URL in this session, so an in-flight job is resumed
//!   instead of duplicated.
//! - At most one automatic submission per normalized URL per session,
//!   guarded by an explicit per-key state map rather than by whoever
//!   happens to call first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use metrics::counter;
use tokio::sync::watch;
use tracing::{info, warn};

use clipnote_extract_client::{ExtractClient, ProcessOptions};
use clipnote_models::{
    detect, JobId, NormalizedUrlResult, Platform, ProcessingStatus, RecommendedAction,
};
use clipnote_storage::ResourceClient;

use crate::completion::{CompletionHandler, CompletionOutcome};
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::poller::{JobPoller, PollUpdate};
use crate::state::{IngestFailure, IngestPhase, IngestSnapshot, LocalOrchestrationState};

/// Handle onto a running (or settled) ingestion flow.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    updates: watch::Receiver<IngestSnapshot>,
}

impl IngestHandle {
    fn settled_now(snapshot: IngestSnapshot) -> Self {
        let (tx, rx) = watch::channel(snapshot);
        drop(tx);
        Self { updates: rx }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> IngestSnapshot {
        self.updates.borrow().clone()
    }

    /// A receiver for rendering live updates.
    pub fn updates(&self) -> watch::Receiver<IngestSnapshot> {
        self.updates.clone()
    }

    /// Wait until the flow reaches a settled phase and return that
    /// snapshot.
    pub async fn settled(&mut self) -> IngestSnapshot {
        loop {
            let current = self.updates.borrow().clone();
            if current.phase.is_settled() {
                return current;
            }
            if self.updates.changed().await.is_err() {
                return self.updates.borrow().clone();
            }
        }
    }
}

struct Inner {
    client: Arc<ExtractClient>,
    poller: JobPoller,
    completion: CompletionHandler,
    config: IngestConfig,
    /// Per-normalized-URL session state (one-shot transition guards)
    sessions: Mutex<HashMap<String, LocalOrchestrationState>>,
    /// Flows attached this session, keyed by normalized URL; re-entry
    /// returns the existing receiver instead of starting a second flow
    active: Mutex<HashMap<String, watch::Receiver<IngestSnapshot>>>,
}

/// Drives URLs from detection to a durable resource.
#[derive(Clone)]
pub struct IngestOrchestrator {
    inner: Arc<Inner>,
}

impl IngestOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        client: Arc<ExtractClient>,
        store: Arc<ResourceClient>,
        config: IngestConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                poller: JobPoller::new(client.clone(), config.clone()),
                completion: CompletionHandler::new(store),
                client,
                config,
                sessions: Mutex::new(HashMap::new()),
                active: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start (or re-attach to) the ingestion flow for a raw URL.
    ///
    /// Unsupported input settles immediately without any network call.
    /// Calling again with any spelling of the same video inside one
    /// session returns the existing flow's handle, which is what makes
    /// UI remounts resume rather than restart.
    pub fn ingest(&self, raw_url: &str) -> IngestHandle {
        let detection = detect(raw_url);
        let Some(key) = detection.normalized_url.clone() else {
            return IngestHandle::settled_now(IngestSnapshot::unsupported(raw_url));
        };

        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = active.get(&key) {
            return IngestHandle {
                updates: rx.clone(),
            };
        }

        let (tx, rx) = watch::channel(IngestSnapshot::idle(
            raw_url,
            Some(key.clone()),
            detection.platform,
        ));
        active.insert(key.clone(), rx.clone());
        drop(active);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.run_flow(key, detection, tx, false).await;
        });

        IngestHandle { updates: rx }
    }

    /// Explicitly resubmit a URL the user chose to process again, e.g.
    /// after an earlier terminal failure or an "already processed"
    /// answer. Replaces any settled flow for the URL and submits without
    /// consulting recovery.
    pub fn reprocess(&self, raw_url: &str) -> IngestHandle {
        let detection = detect(raw_url);
        let Some(key) = detection.normalized_url.clone() else {
            return IngestHandle::settled_now(IngestSnapshot::unsupported(raw_url));
        };

        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (tx, rx) = watch::channel(IngestSnapshot::idle(
            raw_url,
            Some(key.clone()),
            detection.platform,
        ));
        active.insert(key.clone(), rx.clone());
        drop(active);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.run_flow(key, detection, tx, true).await;
        });

        IngestHandle { updates: rx }
    }

    /// Session bookkeeping for a normalized URL, if any flow touched it.
    pub fn session_state(&self, normalized_url: &str) -> Option<LocalOrchestrationState> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(normalized_url)
            .cloned()
    }
}

impl Inner {
    fn update_session(&self, key: &str, f: impl FnOnce(&mut LocalOrchestrationState)) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        f(sessions.entry(key.to_string()).or_default());
    }

    async fn run_flow(
        self: Arc<Self>,
        key: String,
        detection: NormalizedUrlResult,
        tx: watch::Sender<IngestSnapshot>,
        force: bool,
    ) {
        let mut snapshot =
            IngestSnapshot::idle(&detection.raw_url, Some(key.clone()), detection.platform);

        // Recovery: the submission decision below must not be reached
        // until this lookup has resolved (found / not found). A lookup
        // failure means "no information", not "stop": blocking the user
        // on a flaky lookup would be worse than risking a duplicate the
        // server dedups anyway.
        let recovered = if force {
            None
        } else {
            snapshot.phase = IngestPhase::Recovering;
            tx.send_replace(snapshot.clone());

            match self.client.find_existing_job(&key).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(normalized_url = %key, "Recovery lookup failed: {}", e);
                    None
                }
            }
        };
        self.update_session(&key, |state| state.recovery_checked = true);

        match recovered {
            Some(job) if !job.is_terminal() => {
                info!(
                    job_id = %job.job_id,
                    status = %job.status,
                    "Resuming an in-flight job instead of submitting"
                );
                snapshot.status = Some(job.status);
                snapshot.progress = job.progress_pct();
                snapshot.notice = Some("Processing is already underway for this link".to_string());
                let seed = job.poll_interval_ms;
                self.watch_job(&key, job.job_id.clone(), seed, snapshot, &tx, detection.platform)
                    .await;
                return;
            }
            Some(job) if job.status == ProcessingStatus::Completed => {
                self.update_session(&key, |state| state.job_id = Some(job.job_id.clone()));
                snapshot.phase = IngestPhase::AlreadyProcessed;
                snapshot.job_id = Some(job.job_id);
                snapshot.status = Some(job.status);
                snapshot.progress = 100;
                snapshot.notice = Some(
                    "This video was already processed; reprocess it to extract again".to_string(),
                );
                tx.send_replace(snapshot);
                return;
            }
            Some(job) => {
                // Terminal failure: surface it and wait for an explicit
                // user decision; never auto-resubmit over a known failure.
                self.update_session(&key, |state| state.job_id = Some(job.job_id.clone()));
                snapshot.phase = IngestPhase::Failed;
                snapshot.job_id = Some(job.job_id);
                snapshot.status = Some(job.status);
                snapshot.error = Some(match &job.error {
                    Some(job_error) => IngestFailure::from_job_error(job_error),
                    None => IngestFailure {
                        message: "Processing failed".to_string(),
                        action: RecommendedAction::Retry,
                        retry_after_ms: None,
                        fallback_suggestion: None,
                    },
                });
                tx.send_replace(snapshot);
                return;
            }
            None => {}
        }

        // Auto-submit guard: flips false→true exactly once per session
        // for this key, before the await point, so a re-entrant flow
        // cannot submit twice. An explicit reprocess is allowed through.
        let allowed = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let state = sessions.entry(key.clone()).or_default();
            if state.auto_submit_attempted && !force {
                false
            } else {
                state.auto_submit_attempted = true;
                true
            }
        };

        if !allowed {
            snapshot.phase = IngestPhase::Failed;
            snapshot.error = Some(IngestFailure {
                message: "A submission was already attempted for this link in this session"
                    .to_string(),
                action: RecommendedAction::Retry,
                retry_after_ms: None,
                fallback_suggestion: None,
            });
            tx.send_replace(snapshot);
            return;
        }

        snapshot.phase = IngestPhase::Submitting;
        tx.send_replace(snapshot.clone());
        counter!("ingest_submissions_total").increment(1);

        let options = Some(ProcessOptions {
            include_transcript: Some(self.config.include_transcript),
        });

        match self.client.submit(&key, options).await {
            Ok(receipt) => {
                info!(job_id = %receipt.job_id, normalized_url = %key, "Job submitted");
                snapshot.status = Some(receipt.status);
                if let Some(message) = receipt.message {
                    snapshot.notice = Some(message);
                }
                let seed = receipt.poll_interval_ms;
                self.watch_job(&key, receipt.job_id, seed, snapshot, &tx, detection.platform)
                    .await;
            }
            Err(e) => {
                warn!(normalized_url = %key, "Submission failed: {}", e);
                snapshot.phase = IngestPhase::Failed;
                snapshot.error = Some(IngestFailure::from_extract_error(&e));
                tx.send_replace(snapshot);
            }
        }
    }

    async fn watch_job(
        &self,
        key: &str,
        job_id: JobId,
        seed_interval_ms: u64,
        mut snapshot: IngestSnapshot,
        tx: &watch::Sender<IngestSnapshot>,
        platform: Option<Platform>,
    ) {
        self.update_session(key, |state| {
            state.job_id = Some(job_id.clone());
            state.is_polling = true;
        });

        snapshot.phase = IngestPhase::Polling;
        snapshot.job_id = Some(job_id.clone());
        tx.send_replace(snapshot.clone());

        let result = self
            .poller
            .poll_until_terminal(&job_id, seed_interval_ms, |update| match update {
                PollUpdate::Status(job) => {
                    snapshot.status = Some(job.status);
                    snapshot.current_step = job.current_step.clone();
                    snapshot.progress = job.progress_pct();
                    tx.send_replace(snapshot.clone());
                }
                PollUpdate::TakingLongerThanExpected => {
                    snapshot.notice =
                        Some("This is taking longer than expected; still working on it".to_string());
                    tx.send_replace(snapshot.clone());
                }
                PollUpdate::TransientFailure { consecutive } => {
                    snapshot.notice = Some(format!(
                        "Connection hiccup while checking progress (attempt {}); retrying",
                        consecutive
                    ));
                    tx.send_replace(snapshot.clone());
                }
            })
            .await;

        // Polling is over before any side effect runs; a redundant
        // terminal delivery can no longer originate from this flow.
        self.update_session(key, |state| state.is_polling = false);
        snapshot.notice = None;

        match result {
            Ok(job) => match self.completion.on_terminal(&job, platform).await {
                Ok(CompletionOutcome::Created(stored)) => {
                    snapshot.phase = IngestPhase::Completed;
                    snapshot.resource_id = Some(stored.id);
                    snapshot.notice = Some("Saved to your library".to_string());
                }
                Ok(CompletionOutcome::SaveFailed { error, .. }) => {
                    snapshot.phase = IngestPhase::SaveFailed;
                    snapshot.error = Some(IngestFailure {
                        message: format!(
                            "The video was processed, but saving it to your library failed: {}",
                            error
                        ),
                        action: RecommendedAction::Retry,
                        retry_after_ms: None,
                        fallback_suggestion: None,
                    });
                }
                Ok(CompletionOutcome::Failed(job_error)) => {
                    snapshot.phase = IngestPhase::Failed;
                    snapshot.status = Some(job.status);
                    snapshot.error = Some(IngestFailure::from_job_error(&job_error));
                }
                Ok(CompletionOutcome::AlreadyHandled) => {
                    snapshot.phase = IngestPhase::Completed;
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, "Completion handling failed: {}", e);
                    snapshot.phase = IngestPhase::Failed;
                    snapshot.error = Some(IngestFailure {
                        message: e.to_string(),
                        action: RecommendedAction::Retry,
                        retry_after_ms: None,
                        fallback_suggestion: None,
                    });
                }
            },
            Err(IngestError::ConnectivityLost { attempts, .. }) => {
                snapshot.phase = IngestPhase::ConnectivityLost;
                snapshot.error = Some(IngestFailure {
                    message: format!(
                        "Lost contact with the extraction service after {} attempts; the job may still finish",
                        attempts
                    ),
                    action: RecommendedAction::Retry,
                    retry_after_ms: None,
                    fallback_suggestion: None,
                });
            }
            Err(IngestError::Extract(e)) => {
                snapshot.phase = IngestPhase::Failed;
                snapshot.error = Some(IngestFailure::from_extract_error(&e));
            }
            Err(e) => {
                snapshot.phase = IngestPhase::Failed;
                snapshot.error = Some(IngestFailure {
                    message: e.to_string(),
                    action: RecommendedAction::Retry,
                    retry_after_ms: None,
                    fallback_suggestion: None,
                });
            }
        }

        tx.send_replace(snapshot);
    }
}
