//! Extraction service HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use clipnote_models::{JobId, ProcessingJob};

use crate::error::{ExtractError, ExtractResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{
    decode_envelope, ApiOutcome, ProcessAccepted, ProcessOptions, ProcessRequest, StatusPayload,
    SubmitReceipt,
};

/// Configuration for the extraction client.
#[derive(Debug, Clone)]
pub struct ExtractClientConfig {
    /// Base URL of the extraction service
    pub base_url: String,
    /// Bearer token identifying the caller
    pub auth_token: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy for idempotent lookups
    pub retry: RetryConfig,
}

impl ExtractClientConfig {
    /// Create a config with default timeout and retry policy.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("EXTRACT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8787".to_string()),
            auth_token: std::env::var("CLIPNOTE_API_TOKEN").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("EXTRACT_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            retry: RetryConfig::from_env(),
        }
    }
}

/// Client for the short-form extraction service.
///
/// Exposes the three operations the orchestrator needs: submit a job,
/// look up an existing job by normalized URL, and poll a job by id. All
/// calls carry the bearer token; a blank token is rejected at
/// construction rather than silently producing anonymous requests.
pub struct ExtractClient {
    http: Client,
    config: ExtractClientConfig,
}

impl ExtractClient {
    /// Create a new extraction client.
    pub fn new(config: ExtractClientConfig) -> ExtractResult<Self> {
        if config.auth_token.trim().is_empty() {
            return Err(ExtractError::Unauthorized(
                "no API token configured".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ExtractError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ExtractResult<Self> {
        Self::new(ExtractClientConfig::from_env())
    }

    /// Submit a normalized URL for processing.
    ///
    /// Single attempt, no transport-level retry: the caller decides
    /// whether to resubmit on failure, keeping the at-most-one-submission
    /// guarantee in one place.
    pub async fn submit(
        &self,
        normalized_url: &str,
        options: Option<ProcessOptions>,
    ) -> ExtractResult<SubmitReceipt> {
        let url = format!("{}/short-form/process", self.config.base_url);
        let request = ProcessRequest {
            url: normalized_url.to_string(),
            options,
        };

        debug!(normalized_url, "Submitting processing job");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.auth_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        record_request("process", status.as_u16());
        self.check_auth(status)?;

        let body = response.text().await?;
        if status.is_server_error() {
            return Err(ExtractError::RequestFailed(format!(
                "extraction service returned {}: {}",
                status, body
            )));
        }

        match decode_envelope::<ProcessAccepted>(&body) {
            Ok(ApiOutcome::Success(accepted)) => Ok(accepted.into()),
            Ok(ApiOutcome::Failure(error)) => Err(ExtractError::Api(error)),
            Err(_) if !status.is_success() => Err(ExtractError::RequestFailed(format!(
                "extraction service returned {}: {}",
                status, body
            ))),
            Err(e) => Err(e),
        }
    }

    /// Look up an existing job by normalized URL.
    ///
    /// A 404 is the normal "no prior job" outcome and resolves to
    /// `Ok(None)`. The lookup is an idempotent read, so transient
    /// transport failures are retried before the error propagates.
    pub async fn find_existing_job(
        &self,
        normalized_url: &str,
    ) -> ExtractResult<Option<ProcessingJob>> {
        debug!(normalized_url, "Looking up existing job");

        with_retry(&self.config.retry, "status_by_url", || async {
            self.fetch_status(&[("normalizedUrl", normalized_url)], "status_by_url")
                .await
        })
        .await
    }

    /// Fetch the current status of a job by id.
    ///
    /// Single attempt: the polling engine owns failure tolerance across
    /// polls, so stacking another retry layer here would hide it.
    pub async fn job_status(&self, job_id: &JobId) -> ExtractResult<ProcessingJob> {
        let found = self
            .fetch_status(&[("jobId", job_id.as_str())], "status_by_id")
            .await?;

        found.ok_or_else(|| {
            ExtractError::RequestFailed(format!("job {} no longer exists", job_id))
        })
    }

    async fn fetch_status(
        &self,
        query: &[(&str, &str)],
        operation: &str,
    ) -> ExtractResult<Option<ProcessingJob>> {
        let url = format!("{}/short-form/status", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.auth_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        record_request(operation, status.as_u16());

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check_auth(status)?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(ExtractError::RateLimited { retry_after_ms });
        }

        let body = response.text().await?;
        if status.is_server_error() {
            return Err(ExtractError::RequestFailed(format!(
                "extraction service returned {}: {}",
                status, body
            )));
        }

        match decode_envelope::<StatusPayload>(&body)? {
            ApiOutcome::Success(payload) => Ok(Some(payload.into())),
            ApiOutcome::Failure(error)
                if error.code == clipnote_models::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            ApiOutcome::Failure(error) => Err(ExtractError::Api(error)),
        }
    }

    fn check_auth(&self, status: StatusCode) -> ExtractResult<()> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExtractError::Unauthorized(format!(
                "extraction service returned {}",
                status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_models::{ErrorCode, ProcessingStatus};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ExtractClient {
        ExtractClient::new(ExtractClientConfig::new(server.uri(), "test-token")).unwrap()
    }

    #[test]
    fn test_blank_token_rejected_at_construction() {
        let result = ExtractClient::new(ExtractClientConfig::new("http://localhost", "  "));
        assert!(matches!(result, Err(ExtractError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_submit_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/short-form/process"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"success":true,"jobId":"job-1","status":"created","pollIntervalMs":2000}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client_for(&server)
            .submit("https://www.youtube.com/shorts/abc123", None)
            .await
            .unwrap();

        assert_eq!(receipt.job_id.as_str(), "job-1");
        assert_eq!(receipt.status, ProcessingStatus::Created);
        assert_eq!(receipt.poll_interval_ms, 2000);
    }

    #[tokio::test]
    async fn test_submit_api_failure_surfaces_job_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/short-form/process"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"success":false,"error":{"code":"quota_exceeded","message":"Daily quota reached","retryAfterMs":60000}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .submit("https://www.youtube.com/shorts/abc123", None)
            .await
            .unwrap_err();

        match error {
            ExtractError::Api(job_error) => {
                assert_eq!(job_error.code, ErrorCode::QuotaExceeded);
                assert_eq!(job_error.retry_after_ms, Some(60000));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_existing_job_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short-form/status"))
            .and(query_param("normalizedUrl", "https://www.youtube.com/shorts/abc123"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let found = client_for(&server)
            .find_existing_job("https://www.youtube.com/shorts/abc123")
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_existing_job_returns_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short-form/status"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "success": true,
                    "jobId": "job-7",
                    "status": "metadata",
                    "progress": 40,
                    "pollIntervalMs": 1500,
                    "createdAt": "2025-06-01T12:00:00Z",
                    "updatedAt": "2025-06-01T12:00:10Z"
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let job = client_for(&server)
            .find_existing_job("https://www.youtube.com/shorts/abc123")
            .await
            .unwrap()
            .expect("job");

        assert_eq!(job.job_id.as_str(), "job-7");
        assert_eq!(job.status, ProcessingStatus::Metadata);
        assert_eq!(job.poll_interval_ms, 1500);
    }

    #[tokio::test]
    async fn test_job_status_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short-form/status"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .job_status(&JobId::from("job-1"))
            .await
            .unwrap_err();

        assert!(matches!(error, ExtractError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_job_status_maps_terminal_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short-form/status"))
            .and(query_param("jobId", "job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "success": true,
                    "jobId": "job-1",
                    "status": "failed",
                    "error": {"code": "privacy_blocked", "message": "This video is private"},
                    "pollIntervalMs": 2000,
                    "createdAt": "2025-06-01T12:00:00Z",
                    "updatedAt": "2025-06-01T12:00:30Z"
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let job = client_for(&server)
            .job_status(&JobId::from("job-1"))
            .await
            .unwrap();

        assert_eq!(job.status, ProcessingStatus::Failed);
        let error = job.error.expect("error");
        assert_eq!(error.code, ErrorCode::PrivacyBlocked);
        assert_eq!(error.message, "This video is private");
    }
}
