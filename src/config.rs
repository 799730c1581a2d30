use crate::models::SettingsRecord;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

const API_KEY_ENV: &str = "NEXUS_API_KEY";

/// Process-level configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub model: String,
    pub request_timeout: Duration,
    pub history_limit: usize,
    pub data_dir: PathBuf,
    // Fallback credential when the settings record has none
    pub env_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            data_dir: default_data_dir(),
            env_api_key: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Self::default();
        Ok(Self {
            api_url: optional_env("NEXUS_API_URL").unwrap_or(defaults.api_url),
            model: optional_env("NEXUS_MODEL").unwrap_or(defaults.model),
            request_timeout: match optional_env("NEXUS_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(
                    raw.parse::<u64>()
                        .context("NEXUS_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                None => defaults.request_timeout,
            },
            history_limit: match optional_env("NEXUS_HISTORY_LIMIT") {
                Some(raw) => parse_history_limit(&raw)?,
                None => defaults.history_limit,
            },
            data_dir: optional_env("NEXUS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            env_api_key: optional_env(API_KEY_ENV),
        })
    }
}

fn parse_history_limit(raw: &str) -> Result<usize> {
    let limit = raw
        .parse::<usize>()
        .context("NEXUS_HISTORY_LIMIT must be a positive integer")?;
    if limit == 0 {
        anyhow::bail!("NEXUS_HISTORY_LIMIT must be a positive integer, got 0");
    }
    Ok(limit)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nexus")
}

// --- API Key Retrieval ---

/// Resolves the credential for a generation call.
///
/// Order: the settings record, then `NEXUS_API_KEY`. `None` means generation is disabled.
pub fn resolve_api_key(settings: &SettingsRecord, config: &AppConfig) -> Option<String> {
    if let Some(key) = settings.configured_api_key() {
        log::debug!("Using API key from settings");
        return Some(key.to_string());
    }
    match config.env_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            log::debug!("Using API key from environment variable {}", API_KEY_ENV);
            Some(key.to_string())
        }
        _ => {
            log::debug!("No API key configured");
            None
        }
    }
}
