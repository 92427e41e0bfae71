//! Resource persistence HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use clipnote_models::{NewResource, Resource};

use crate::error::{StorageError, StorageResult};

/// Configuration for the resource client.
#[derive(Debug, Clone)]
pub struct ResourceClientConfig {
    /// Base URL of the ClipNote backend
    pub base_url: String,
    /// Bearer token identifying the user
    pub auth_token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ResourceClientConfig {
    /// Create a config with the default timeout.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CLIPNOTE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8788".to_string()),
            auth_token: std::env::var("CLIPNOTE_API_TOKEN").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("CLIPNOTE_API_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            ),
        }
    }
}

/// Client for the resource store of the ClipNote backend.
///
/// The ingestion flow uses exactly one operation: create a resource from
/// a completed extraction. Reads, updates, and deletes belong to the
/// note-taking side of the product and are not exposed here.
pub struct ResourceClient {
    http: Client,
    config: ResourceClientConfig,
}

impl ResourceClient {
    /// Create a new resource client.
    pub fn new(config: ResourceClientConfig) -> StorageResult<Self> {
        if config.auth_token.trim().is_empty() {
            return Err(StorageError::Unauthorized(
                "no API token configured".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(StorageError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(ResourceClientConfig::from_env())
    }

    /// Persist a new resource and return the stored record.
    pub async fn add_resource(&self, resource: &NewResource) -> StorageResult<Resource> {
        let url = format!("{}/resources", self.config.base_url);

        debug!(resource_id = %resource.id, title = %resource.title, "Creating resource");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.auth_token)
            .json(resource)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::Unauthorized(format!(
                "backend returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::create_failed(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let stored: Resource = response.json().await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clipnote_models::{ExtractionMethod, Platform, ResourceId, ResourceKind};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_resource() -> NewResource {
        NewResource {
            id: ResourceId::from_string("res-1"),
            title: "Test Video".to_string(),
            description: String::new(),
            creator: "Creator".to_string(),
            duration: Some("0:45".to_string()),
            tags: vec!["cooking".to_string()],
            transcript: None,
            source_url: "https://www.youtube.com/shorts/abc123".to_string(),
            platform: Some(Platform::YoutubeShort),
            kind: ResourceKind::Video,
            extraction_method: ExtractionMethod::ShortFormAuto,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_token_rejected_at_construction() {
        let result = ResourceClient::new(ResourceClientConfig::new("http://localhost", ""));
        assert!(matches!(result, Err(StorageError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_add_resource_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resources"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(201).set_body_raw(
                r#"{
                    "id": "res-1",
                    "created_at": "2025-06-01T12:01:00Z",
                    "title": "Test Video",
                    "creator": "Creator",
                    "duration": "0:45",
                    "tags": ["cooking"],
                    "source_url": "https://www.youtube.com/shorts/abc123",
                    "platform": "youtube-short",
                    "kind": "video",
                    "extraction_method": "short_form_auto",
                    "extracted_at": "2025-06-01T12:00:30Z"
                }"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            ResourceClient::new(ResourceClientConfig::new(server.uri(), "test-token")).unwrap();

        let stored = client.add_resource(&sample_resource()).await.unwrap();
        assert_eq!(stored.id.as_str(), "res-1");
        assert_eq!(stored.record.title, "Test Video");
    }

    #[tokio::test]
    async fn test_add_resource_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resources"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client =
            ResourceClient::new(ResourceClientConfig::new(server.uri(), "test-token")).unwrap();

        let error = client.add_resource(&sample_resource()).await.unwrap_err();
        assert!(matches!(error, StorageError::CreateFailed(_)));
    }
}
