use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Number of topic characters carried into a generated title
const TITLE_TOPIC_CHARS: usize = 20;

// The user's settings record, persisted wholesale under a single key
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub username: String,
    pub role: String,
    pub email_notifications: bool,
    pub auto_save: bool, // Displayed only; history is always written
    // Credential for the generation API. None or blank means "not configured".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            username: "Admin_User".to_string(),
            role: "Chief Operations".to_string(),
            email_notifications: true,
            auto_save: true,
            api_key: None,
        }
    }
}

impl SettingsRecord {
    /// Returns the stored credential if it is present and not blank.
    pub fn configured_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Copy of the record with the credential stripped, used for display and export.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: None,
            ..self.clone()
        }
    }
}

// Platform the content is written for
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ContentType {
    #[value(name = "linkedin")]
    LinkedIn,
    #[value(name = "twitter")]
    Twitter,
    #[value(name = "blog")]
    Blog,
    #[value(name = "email")]
    Email,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::LinkedIn,
        ContentType::Twitter,
        ContentType::Blog,
        ContentType::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::LinkedIn => "LinkedIn",
            ContentType::Twitter => "Twitter",
            ContentType::Blog => "Blog",
            ContentType::Email => "Email",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown content type '{}'. Expected one of: LinkedIn, Twitter, Blog, Email",
                    s
                )
            })
    }
}

// Whether an archived item holds generated text or the reason generation failed
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ContentStatus {
    #[default]
    Generated,
    Failed,
}

// One archived generation attempt
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String, // UUID v4 for new items; older archives carry millisecond timestamps
    pub topic: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub timestamp: i64, // Unix timestamp (milliseconds)
    #[serde(default)] // Records written before the status field existed were all stored as content
    pub status: ContentStatus,
}

impl ContentItem {
    /// Builds a new item stamped with a fresh id and the current time.
    pub fn new(topic: &str, content_type: ContentType, body: String, status: ContentStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            title: derive_title(topic, content_type),
            body,
            content_type,
            timestamp: Utc::now().timestamp_millis(),
            status,
        }
    }
}

/// `"{type} Strategy: {first 20 chars of topic}..."`
pub fn derive_title(topic: &str, content_type: ContentType) -> String {
    let head: String = topic.chars().take(TITLE_TOPIC_CHARS).collect();
    format!("{} Strategy: {}...", content_type, head)
}

// The downloadable backup: settings plus the full archive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExportBundle {
    pub settings: SettingsRecord,
    pub history: Vec<ContentItem>,
}
