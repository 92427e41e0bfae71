//! Shared data models for the ClipNote ingestion client.
//!
//! This crate provides Serde-serializable types for:
//! - Short-form URL detection and normalization
//! - The processing-job read model and its status/error taxonomy
//! - Extracted video metadata
//! - Library resource records

pub mod job;
pub mod metadata;
pub mod resource;
pub mod shortform_url;
pub mod utils;

// Re-export common types
pub use job::{ErrorCode, JobError, JobId, ProcessingJob, ProcessingStatus, RecommendedAction};
pub use metadata::{format_duration, ShortFormMetadata};
pub use resource::{
    ExtractionMethod, NewResource, Resource, ResourceId, ResourceKind, ResourceMapError,
};
pub use shortform_url::{detect, NormalizedUrlResult, Platform};
