//! Extracted short-form video metadata.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata returned by the extraction pipeline for a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShortFormMetadata {
    /// Video title (platform caption for TikTok/Instagram)
    pub title: String,

    /// Longer description, when the platform distinguishes it from the title
    #[serde(default)]
    pub description: String,

    /// Creator display name
    pub creator_name: String,

    /// Creator handle (e.g. `@somecreator`), when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_handle: Option<String>,

    /// Duration in whole seconds
    pub duration_seconds: u32,

    /// Hashtags as extracted, possibly with leading `#`
    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Thumbnail image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Original publication time, when the platform exposes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl ShortFormMetadata {
    /// Hashtags normalized into resource tags: `#` stripped, trimmed,
    /// lowercased, deduplicated, empties dropped.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        for raw in &self.hashtags {
            let tag = raw.trim().trim_start_matches('#').to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// Format a duration in seconds as `m:ss` (`45` → `"0:45"`, `125` →
/// `"2:05"`). Durations of an hour or more roll into `h:mm:ss`.
pub fn format_duration(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShortFormMetadata {
        ShortFormMetadata {
            title: "Test Video".to_string(),
            description: String::new(),
            creator_name: "Creator".to_string(),
            creator_handle: Some("@creator".to_string()),
            duration_seconds: 45,
            hashtags: vec![
                "#Cooking".to_string(),
                "recipe".to_string(),
                "  #cooking ".to_string(),
                "#".to_string(),
            ],
            thumbnail_url: None,
            published_at: None,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(45), "0:45");
        assert_eq!(format_duration(60), "1:00");
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(599), "9:59");
        assert_eq!(format_duration(3661), "1:01:01");
    }

    #[test]
    fn test_normalized_tags() {
        let tags = sample().normalized_tags();
        assert_eq!(tags, vec!["cooking".to_string(), "recipe".to_string()]);
    }

    #[test]
    fn test_metadata_deserializes_with_missing_optionals() {
        let json = r#"{
            "title": "Test Video",
            "creator_name": "Creator",
            "duration_seconds": 45
        }"#;
        let meta: ShortFormMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title, "Test Video");
        assert!(meta.hashtags.is_empty());
        assert!(meta.description.is_empty());
    }
}
