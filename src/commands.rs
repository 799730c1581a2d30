// Operations the UI shell drives. Errors come back as user-facing strings.

use crate::generation::GenerationOutcome;
use crate::models::{ContentItem, ContentType, ExportBundle, SettingsRecord};
use crate::state::AppState;
use std::path::{Path, PathBuf};

pub const BUSY_MESSAGE: &str = "A generation request is already in progress.";
pub const DEFAULT_EXPORT_FILE: &str = "nexus_ai_backup.json";
pub const DEFAULT_TREND_CONTEXT: &str =
    "Weekly traffic shows 45% growth in organic channels. User retention stable at 88%.";

// Estimated value of one generated piece, in dollars
const VALUE_PER_ITEM: usize = 25;

/// What a generate call produced and what (if anything) was archived.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub outcome: GenerationOutcome,
    pub archived: Option<ContentItem>,
}

impl GenerationReport {
    pub fn text(&self) -> &str {
        self.outcome.text()
    }
}

/// Partial settings edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub username: Option<String>,
    pub role: Option<String>,
    pub email_notifications: Option<bool>,
    pub auto_save: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub content_generated: usize,
    pub last_active: Option<i64>, // Unix timestamp (milliseconds) of the newest item
    pub est_value_saved: usize,
}

// --- Generation ---

/// Generates content for `topic` and archives the attempt.
///
/// Only one request may be outstanding; a second call while one is in flight is
/// rejected and leaves the archive untouched.
pub async fn generate_content(
    state: &AppState,
    topic: &str,
    content_type: ContentType,
) -> Result<GenerationReport, String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err("Topic cannot be empty.".to_string());
    }

    let Some(_guard) = state.try_begin_generation() else {
        log::warn!("Rejected generate request for '{}': another is in flight", topic);
        return Err(BUSY_MESSAGE.to_string());
    };

    let outcome = state.generator.generate(topic, content_type).await;

    let archived = match outcome.archive_status() {
        Some(status) => {
            let item = ContentItem::new(topic, content_type, outcome.text().to_string(), status);
            state.history.append(item.clone()).await.map_err(|e| {
                log::error!("Failed to archive generated content: {:?}", e);
                format!("Failed to archive content: {}", e)
            })?;
            Some(item)
        }
        None => None,
    };

    Ok(GenerationReport { outcome, archived })
}

pub async fn analyze_trends(state: &AppState, context: Option<&str>) -> String {
    let context = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_TREND_CONTEXT);
    log::info!("Requested trend analysis");
    state.summarizer.summarize(context).await
}

// --- History ---

pub async fn list_history(state: &AppState) -> Vec<ContentItem> {
    state.history.load().await
}

pub async fn get_history_item(state: &AppState, id: &str) -> Result<ContentItem, String> {
    state
        .history
        .get(id)
        .await
        .ok_or_else(|| format!("No archived item with ID {}", id))
}

pub async fn delete_history_item(state: &AppState, id: &str) -> Result<Vec<ContentItem>, String> {
    log::warn!("Requested to delete history item: {}", id);
    state
        .history
        .remove(id)
        .await
        .map_err(|e| format!("Failed to delete item: {}", e))
}

pub async fn clear_history(state: &AppState) -> Result<(), String> {
    state
        .history
        .clear()
        .await
        .map_err(|e| format!("Failed to clear history: {}", e))
}

/// Destroys the whole archive. There is no undo.
pub async fn purge_archives(state: &AppState) -> Result<(), String> {
    log::warn!("Purging local archives");
    clear_history(state).await
}

// --- Settings ---

pub async fn load_settings(state: &AppState) -> SettingsRecord {
    state.settings.load().await
}

pub async fn save_settings(state: &AppState, settings: &SettingsRecord) -> Result<(), String> {
    state
        .settings
        .save(settings)
        .await
        .map_err(|e| format!("Failed to save settings: {}", e))
}

pub async fn update_settings(
    state: &AppState,
    update: SettingsUpdate,
) -> Result<SettingsRecord, String> {
    let mut settings = state.settings.try_load().await.map_err(|e| {
        log::error!("Refusing to update settings: {:?}", e);
        format!("Failed to read settings: {}", e)
    })?;
    if let Some(username) = update.username {
        settings.username = username;
    }
    if let Some(role) = update.role {
        settings.role = role;
    }
    if let Some(email_notifications) = update.email_notifications {
        settings.email_notifications = email_notifications;
    }
    if let Some(auto_save) = update.auto_save {
        settings.auto_save = auto_save;
    }
    save_settings(state, &settings).await?;
    Ok(settings)
}

pub async fn set_api_key(state: &AppState, api_key: &str) -> Result<SettingsRecord, String> {
    state
        .settings
        .set_api_key(api_key)
        .await
        .map_err(|e| format!("Failed to store API key: {}", e))
}

pub async fn clear_api_key(state: &AppState) -> Result<SettingsRecord, String> {
    state
        .settings
        .clear_api_key()
        .await
        .map_err(|e| format!("Failed to clear API key: {}", e))
}

// --- Export & dashboard ---

/// Settings (credential removed) plus the full archive.
pub async fn build_export_bundle(state: &AppState) -> ExportBundle {
    ExportBundle {
        settings: state.settings.load().await.redacted(),
        history: state.history.load().await,
    }
}

/// Writes the backup to `path` (or `nexus_ai_backup.json`) and returns where it went.
pub async fn export_data(state: &AppState, path: Option<&Path>) -> Result<PathBuf, String> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    let bundle = build_export_bundle(state).await;
    let json = serde_json::to_string_pretty(&bundle)
        .map_err(|e| format!("Failed to serialize export: {}", e))?;

    tokio::fs::write(&path, json).await.map_err(|e| {
        log::error!("Failed to write export to {}: {:?}", path.display(), e);
        format!("Failed to write export file: {}", e)
    })?;

    log::info!(
        "Exported {} history items to {}",
        bundle.history.len(),
        path.display()
    );
    Ok(path)
}

pub async fn dashboard_metrics(state: &AppState) -> DashboardMetrics {
    let history = state.history.load().await;
    DashboardMetrics {
        content_generated: history.len(),
        last_active: history.first().map(|item| item.timestamp),
        est_value_saved: history.len() * VALUE_PER_ITEM,
    }
}
