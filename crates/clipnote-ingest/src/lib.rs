//! Short-form ingestion orchestrator for ClipNote.
//!
//! Turns a pasted TikTok / YouTube Shorts / Instagram Reel URL into a
//! durable library resource by driving a remote extraction job to a
//! terminal state:
//!
//! 1. Detect the platform and normalize the URL (pure, local).
//! 2. Recover any existing job for that URL so a reload resumes instead
//!    of resubmitting.
//! 3. Submit a new job when there is nothing to resume.
//! 4. Poll at the server-suggested cadence until terminal.
//! 5. On completion, create the library resource exactly once.

pub mod completion;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod state;

pub use completion::{CompletionHandler, CompletionOutcome};
pub use config::IngestConfig;
pub use error::{IngestError, IngestResult};
pub use orchestrator::{IngestHandle, IngestOrchestrator};
pub use poller::{JobPoller, PollUpdate};
pub use state::{IngestFailure, IngestPhase, IngestSnapshot, LocalOrchestrationState};
