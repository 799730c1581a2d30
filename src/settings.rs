use crate::models::SettingsRecord;
use crate::storage::{KeyValueStore, SETTINGS_KEY};
use anyhow::Context;
use std::sync::Arc;

/// Reads and writes the settings record. The credential lives here and nowhere else.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the persisted record, or the defaults when nothing usable is stored.
    ///
    /// For display only: an unreadable store also yields the defaults. Anything that
    /// writes the record back must use `try_load`.
    pub async fn load(&self) -> SettingsRecord {
        match self.try_load().await {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to read settings, using defaults: {:?}", e);
                SettingsRecord::default()
            }
        }
    }

    /// Like `load`, but a failed store read is returned as an error.
    ///
    /// A missing key or a record that does not parse still yields the defaults.
    pub async fn try_load(&self) -> anyhow::Result<SettingsRecord> {
        let Some(raw) = self
            .store
            .get(SETTINGS_KEY)
            .await
            .context("Failed to read settings")?
        else {
            log::debug!("No settings persisted yet, using defaults");
            return Ok(SettingsRecord::default());
        };

        match serde_json::from_str::<SettingsRecord>(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                log::warn!("Persisted settings are malformed, using defaults: {}", e);
                Ok(SettingsRecord::default())
            }
        }
    }

    /// Overwrites the whole record.
    pub async fn save(&self, settings: &SettingsRecord) -> anyhow::Result<()> {
        let json = serde_json::to_string(settings).context("Failed to serialize settings")?;
        self.store.set(SETTINGS_KEY, &json).await?;
        log::info!("Settings saved for '{}'", settings.username);
        Ok(())
    }

    /// Stores a trimmed credential; a blank value clears it instead.
    pub async fn set_api_key(&self, api_key: &str) -> anyhow::Result<SettingsRecord> {
        let mut settings = self.try_load().await?;
        let trimmed = api_key.trim();
        settings.api_key = if trimmed.is_empty() {
            log::info!("Blank API key supplied, clearing credential");
            None
        } else {
            log::info!("Storing API key in settings");
            Some(trimmed.to_string())
        };
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn clear_api_key(&self) -> anyhow::Result<SettingsRecord> {
        let mut settings = self.try_load().await?;
        settings.api_key = None;
        self.save(&settings).await?;
        log::info!("API key cleared from settings");
        Ok(settings)
    }
}
