use crate::api::GenerativeApiProvider;
use crate::config::AppConfig;
use crate::generation::{GenerationClient, ModelGateway, TrendSummarizer};
use crate::history::HistoryStore;
use crate::settings::SettingsStore;
use crate::storage::KeyValueStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Core application state shared by every command
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: SettingsStore,
    pub history: HistoryStore,
    pub generator: GenerationClient,
    pub summarizer: TrendSummarizer,
    // Set while a generation request is outstanding
    generating: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api_provider: Arc<dyn GenerativeApiProvider>,
        config: AppConfig,
    ) -> Self {
        let config = Arc::new(config);
        let settings = SettingsStore::new(store.clone());
        let history = HistoryStore::new(store, config.history_limit);
        let gateway = ModelGateway::new(api_provider, settings.clone(), config.clone());

        Self {
            config,
            settings,
            history,
            generator: GenerationClient::new(gateway.clone()),
            summarizer: TrendSummarizer::new(gateway),
            generating: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claims the generation slot. `None` if another request already holds it.
    pub fn try_begin_generation(&self) -> Option<GenerationGuard> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationGuard {
                flag: self.generating.clone(),
            })
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }
}

/// Releases the generation slot when dropped.
pub struct GenerationGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
