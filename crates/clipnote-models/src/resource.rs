//! Library resource records.
//!
//! A resource is the durable, user-visible outcome of a successful
//! ingestion: the note-taking side of the product attaches annotations to
//! it. The ingestion client only ever creates resources; it never updates
//! or deletes them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::job::{ProcessingJob, ProcessingStatus};
use crate::metadata::format_duration;
use crate::shortform_url::Platform;

/// Unique identifier for a library resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Generate a new random resource ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of library resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Book,
    #[default]
    Video,
    Podcast,
    Article,
}

/// How a resource's fields were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Filled automatically from a short-form video extraction job
    ShortFormAuto,
    /// Entered by hand
    Manual,
}

/// A resource record to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewResource {
    /// Client-generated resource id
    pub id: ResourceId,

    /// Resource title
    pub title: String,

    /// Description / caption text
    #[serde(default)]
    pub description: String,

    /// Creator display name
    pub creator: String,

    /// Duration formatted as `m:ss`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Tags derived from hashtags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Full transcript, when captions were available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Canonical source URL
    pub source_url: String,

    /// Source platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Resource kind
    #[serde(default)]
    pub kind: ResourceKind,

    /// Provenance: how the fields were produced
    pub extraction_method: ExtractionMethod,

    /// Provenance: when extraction finished
    pub extracted_at: DateTime<Utc>,
}

/// Failure to map a job into a resource.
///
/// `MissingMetadata` indicates a broken contract on the server side: a
/// `completed` status without a metadata payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceMapError {
    #[error("job {0} has not completed")]
    NotCompleted(String),

    #[error("completed job {0} is missing metadata")]
    MissingMetadata(String),
}

impl NewResource {
    /// Build a resource from a completed job.
    ///
    /// The job must be in `Completed` status with metadata present;
    /// anything else is a mapping error, never a partially-filled record.
    pub fn from_completed_job(
        job: &ProcessingJob,
        platform: Option<Platform>,
    ) -> Result<Self, ResourceMapError> {
        if job.status != ProcessingStatus::Completed {
            return Err(ResourceMapError::NotCompleted(job.job_id.to_string()));
        }

        let metadata = job
            .metadata
            .as_ref()
            .ok_or_else(|| ResourceMapError::MissingMetadata(job.job_id.to_string()))?;

        let creator = if metadata.creator_name.is_empty() {
            metadata.creator_handle.clone().unwrap_or_default()
        } else {
            metadata.creator_name.clone()
        };

        Ok(Self {
            id: ResourceId::new(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            creator,
            duration: Some(format_duration(metadata.duration_seconds)),
            tags: metadata.normalized_tags(),
            transcript: job.transcript.clone(),
            source_url: job.normalized_url.clone().unwrap_or_default(),
            platform,
            kind: ResourceKind::Video,
            extraction_method: ExtractionMethod::ShortFormAuto,
            extracted_at: job.completed_at.unwrap_or(job.updated_at),
        })
    }
}

/// A stored resource record, as echoed back by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    /// Resource id
    pub id: ResourceId,

    /// Creation timestamp assigned by the backend
    pub created_at: DateTime<Utc>,

    /// The persisted fields
    #[serde(flatten)]
    pub record: ResourceBody,
}

/// Persisted resource fields shared by [`NewResource`] and [`Resource`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub creator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub kind: ResourceKind,
    pub extraction_method: ExtractionMethod,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use crate::metadata::ShortFormMetadata;

    fn completed_job() -> ProcessingJob {
        let now = Utc::now();
        ProcessingJob {
            job_id: JobId::from("job-1"),
            normalized_url: Some("https://www.youtube.com/shorts/abc123".to_string()),
            status: ProcessingStatus::Completed,
            current_step: None,
            progress: 100,
            metadata: Some(ShortFormMetadata {
                title: "Test Video".to_string(),
                description: "A test".to_string(),
                creator_name: "Creator".to_string(),
                creator_handle: Some("@creator".to_string()),
                duration_seconds: 45,
                hashtags: vec!["#cooking".to_string()],
                thumbnail_url: None,
                published_at: None,
            }),
            transcript: Some("hello world".to_string()),
            error: None,
            poll_interval_ms: 2000,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        }
    }

    #[test]
    fn test_from_completed_job() {
        let resource =
            NewResource::from_completed_job(&completed_job(), Some(Platform::YoutubeShort))
                .unwrap();

        assert_eq!(resource.title, "Test Video");
        assert_eq!(resource.creator, "Creator");
        assert_eq!(resource.duration.as_deref(), Some("0:45"));
        assert_eq!(resource.tags, vec!["cooking".to_string()]);
        assert_eq!(resource.transcript.as_deref(), Some("hello world"));
        assert_eq!(resource.kind, ResourceKind::Video);
        assert_eq!(resource.extraction_method, ExtractionMethod::ShortFormAuto);
        assert_eq!(
            resource.source_url,
            "https://www.youtube.com/shorts/abc123"
        );
    }

    #[test]
    fn test_missing_metadata_is_contract_violation() {
        let mut job = completed_job();
        job.metadata = None;

        let result = NewResource::from_completed_job(&job, None);
        assert_eq!(
            result.unwrap_err(),
            ResourceMapError::MissingMetadata("job-1".to_string())
        );
    }

    #[test]
    fn test_non_completed_job_rejected() {
        let mut job = completed_job();
        job.status = ProcessingStatus::Metadata;

        let result = NewResource::from_completed_job(&job, None);
        assert_eq!(
            result.unwrap_err(),
            ResourceMapError::NotCompleted("job-1".to_string())
        );
    }

    #[test]
    fn test_creator_falls_back_to_handle() {
        let mut job = completed_job();
        if let Some(meta) = job.metadata.as_mut() {
            meta.creator_name = String::new();
        }

        let resource = NewResource::from_completed_job(&job, None).unwrap();
        assert_eq!(resource.creator, "@creator");
    }
}
