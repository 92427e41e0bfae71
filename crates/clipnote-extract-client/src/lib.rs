//! Client for the short-form extraction service.
//!
//! The service runs the actual platform detection and metadata/transcript
//! extraction remotely; this crate only speaks its two-endpoint HTTP
//! surface (submit a job, query job status) and decodes the tagged
//! success/error envelope into typed results.

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod types;

pub use client::{ExtractClient, ExtractClientConfig};
pub use error::{ExtractError, ExtractResult};
pub use retry::RetryConfig;
pub use types::{ApiOutcome, ProcessOptions, SubmitReceipt};
