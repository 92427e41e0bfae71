//! Extraction client metrics.
//!
//! Request counters by operation and status, plus retry counters. A
//! metrics recorder is installed (or not) by the embedding application.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total extraction-service requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "extract_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "extract_retries_total";
}

/// Record a completed extraction-service request.
pub fn record_request(operation: &str, status: u16) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}
