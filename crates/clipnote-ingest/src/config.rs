//! Orchestrator configuration.

use std::time::Duration;

/// Ingestion configuration.
///
/// Poll pacing always follows the server-suggested interval; the clamp
/// bounds only guard against a missing or absurd suggestion.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Poll delay used when the server does not suggest one
    pub default_poll_interval: Duration,
    /// Lower clamp for server-suggested poll delays
    pub min_poll_interval: Duration,
    /// Upper clamp for server-suggested poll delays
    pub max_poll_interval: Duration,
    /// Consecutive poll failures tolerated before surfacing a
    /// connectivity error
    pub max_consecutive_poll_failures: u32,
    /// Wall-clock ceiling after which a "taking longer than expected"
    /// notice is shown (polling continues)
    pub soft_deadline: Duration,
    /// Ask the pipeline for a transcript
    pub include_transcript: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_poll_interval: Duration::from_millis(2000),
            min_poll_interval: Duration::from_millis(500),
            max_poll_interval: Duration::from_secs(30),
            max_consecutive_poll_failures: 3,
            soft_deadline: Duration::from_secs(120),
            include_transcript: true,
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            default_poll_interval: Duration::from_millis(
                std::env::var("INGEST_DEFAULT_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
            min_poll_interval: Duration::from_millis(
                std::env::var("INGEST_MIN_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            max_poll_interval: Duration::from_millis(
                std::env::var("INGEST_MAX_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
            ),
            max_consecutive_poll_failures: std::env::var("INGEST_MAX_POLL_FAILURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            soft_deadline: Duration::from_secs(
                std::env::var("INGEST_SOFT_DEADLINE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            include_transcript: std::env::var("INGEST_INCLUDE_TRANSCRIPT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Clamp a server-suggested poll interval, falling back to the
    /// default when the server provided none.
    pub fn effective_poll_interval(&self, suggested_ms: u64) -> Duration {
        if suggested_ms == 0 {
            return self.default_poll_interval;
        }
        Duration::from_millis(suggested_ms)
            .clamp(self.min_poll_interval, self.max_poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_poll_interval_uses_suggestion() {
        let config = IngestConfig::default();
        assert_eq!(
            config.effective_poll_interval(2000),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_effective_poll_interval_defaults_when_missing() {
        let config = IngestConfig::default();
        assert_eq!(config.effective_poll_interval(0), config.default_poll_interval);
    }

    #[test]
    fn test_effective_poll_interval_clamps() {
        let config = IngestConfig::default();
        assert_eq!(config.effective_poll_interval(1), config.min_poll_interval);
        assert_eq!(
            config.effective_poll_interval(10_000_000),
            config.max_poll_interval
        );
    }
}
