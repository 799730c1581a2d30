use crate::api::{GenerationError, GenerativeApiProvider};
use crate::config::{resolve_api_key, AppConfig};
use crate::models::{ContentStatus, ContentType};
use crate::settings::SettingsStore;
use std::sync::Arc;

pub const DISABLED_MESSAGE: &str = "SYSTEM ALERT: Neural Link Disconnected.\n\n\
ACTION REQUIRED:\n\
1. Navigate to the 'System Config' screen.\n\
2. Enter your API key (or set NEXUS_API_KEY).\n\
3. Save Configuration.\n\n\
Content generation is disabled until a key is configured.";
pub const EMPTY_GENERATION_MESSAGE: &str = "Output generation failed.";

pub const INSIGHT_OFFLINE_MESSAGE: &str =
    "Neural Analysis Offline - Please Configure API Key in Settings.";
pub const INSIGHT_INTERRUPTED_MESSAGE: &str = "Neural analysis interrupted.";
pub const INSIGHT_EMPTY_MESSAGE: &str = "Analysis unavailable.";

fn platform_guidance(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::LinkedIn => {
            "A LinkedIn post: strong hook in the first line, short paragraphs, end with a question for the reader."
        }
        ContentType::Twitter => {
            "A tweet thread: numbered tweets, each under 280 characters, first tweet must stand alone."
        }
        ContentType::Blog => {
            "A blog article: title, short introduction, 3-5 headed sections, concise conclusion."
        }
        ContentType::Email => {
            "A marketing email: subject line, preview text, body with one clear call to action."
        }
    }
}

pub fn content_prompt(topic: &str, content_type: ContentType) -> String {
    format!(
        "You are NEXUS-AI, a business intelligence copywriter.\n\
         OBJECTIVE: Generate high-conversion {content_type} content about \"{topic}\".\n\
         FORMAT: {guidance}\n\
         TONE: Authoritative, professional, insightful.\n\
         RESTRICTIONS: No filler. Use clear headers where the format allows.",
        content_type = content_type,
        topic = topic,
        guidance = platform_guidance(content_type),
    )
}

pub fn insight_prompt(context: &str) -> String {
    format!(
        "DATA CONTEXT: {}\n\
         DIRECTIVE: Write a two-sentence executive summary of this market data and name the key growth vector.",
        context
    )
}

/// Resolves the credential and performs one bounded call to the provider.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn GenerativeApiProvider>,
    settings: SettingsStore,
    config: Arc<AppConfig>,
}

impl ModelGateway {
    pub fn new(
        provider: Arc<dyn GenerativeApiProvider>,
        settings: SettingsStore,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            provider,
            settings,
            config,
        }
    }

    /// Returns `ConfigurationMissing` without contacting the provider when no key resolves.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let settings = self.settings.load().await;
        let api_key =
            resolve_api_key(&settings, &self.config).ok_or(GenerationError::ConfigurationMissing)?;

        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.provider.generate_text(&api_key, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        }
    }
}

/// Result of one content generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    /// No credential; the provider was not called.
    Disabled,
    /// User-visible description of what went wrong.
    Failed(String),
}

impl GenerationOutcome {
    /// The string shown to the user. Every outcome has one.
    pub fn text(&self) -> &str {
        match self {
            GenerationOutcome::Generated(text) => text,
            GenerationOutcome::Disabled => DISABLED_MESSAGE,
            GenerationOutcome::Failed(message) => message,
        }
    }

    /// How the outcome is archived, if at all.
    pub fn archive_status(&self) -> Option<ContentStatus> {
        match self {
            GenerationOutcome::Generated(_) => Some(ContentStatus::Generated),
            GenerationOutcome::Failed(_) => Some(ContentStatus::Failed),
            GenerationOutcome::Disabled => None,
        }
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    gateway: ModelGateway,
}

impl GenerationClient {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    /// Generates content for `topic`. Never returns an error; failures become outcomes.
    pub async fn generate(&self, topic: &str, content_type: ContentType) -> GenerationOutcome {
        log::info!("Generating {} content for topic: {}", content_type, topic);
        let prompt = content_prompt(topic, content_type);

        match self.gateway.complete(&prompt).await {
            Ok(text) if text.trim().is_empty() => {
                log::warn!("Provider returned empty text for topic: {}", topic);
                GenerationOutcome::Failed(EMPTY_GENERATION_MESSAGE.to_string())
            }
            Ok(text) => GenerationOutcome::Generated(text),
            Err(GenerationError::ConfigurationMissing) => {
                log::warn!("Generation disabled: no API key configured");
                GenerationOutcome::Disabled
            }
            Err(e) => {
                log::error!("Generation failed: {:?}", e);
                GenerationOutcome::Failed(format!("ERROR: {}", e))
            }
        }
    }
}

/// Short executive summaries for the dashboard insight panel.
#[derive(Clone)]
pub struct TrendSummarizer {
    gateway: ModelGateway,
}

impl TrendSummarizer {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    pub async fn summarize(&self, context: &str) -> String {
        match self.gateway.complete(&insight_prompt(context)).await {
            Ok(text) if text.trim().is_empty() => INSIGHT_EMPTY_MESSAGE.to_string(),
            Ok(text) => text,
            Err(GenerationError::ConfigurationMissing) => INSIGHT_OFFLINE_MESSAGE.to_string(),
            Err(e) => {
                log::warn!("Trend analysis failed: {:?}", e);
                INSIGHT_INTERRUPTED_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubProvider;
    use crate::models::SettingsRecord;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    async fn gateway(provider: Arc<StubProvider>, key: Option<&str>, config: AppConfig) -> ModelGateway {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        if let Some(key) = key {
            settings
                .save(&SettingsRecord {
                    api_key: Some(key.to_string()),
                    ..SettingsRecord::default()
                })
                .await
                .unwrap();
        }
        ModelGateway::new(provider, settings, Arc::new(config))
    }

    fn no_env_key() -> AppConfig {
        AppConfig {
            env_api_key: None,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn no_credential_disables_without_calling_provider() {
        let provider = Arc::new(StubProvider::replying("unused"));
        let client = GenerationClient::new(gateway(provider.clone(), None, no_env_key()).await);

        let outcome = client.generate("AI", ContentType::LinkedIn).await;

        assert_eq!(outcome, GenerationOutcome::Disabled);
        assert_eq!(outcome.text(), DISABLED_MESSAGE);
        assert_eq!(outcome.archive_status(), None);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn success_returns_text_verbatim() {
        let provider = Arc::new(StubProvider::replying("Hello"));
        let client = GenerationClient::new(gateway(provider.clone(), Some("k"), no_env_key()).await);

        let outcome = client.generate("AI", ContentType::LinkedIn).await;

        assert_eq!(outcome.text(), "Hello");
        assert_eq!(outcome.archive_status(), Some(ContentStatus::Generated));
        assert_eq!(provider.calls(), 1);
        let prompt = provider.last_prompt().await.unwrap();
        assert!(prompt.contains("\"AI\""));
        assert!(prompt.contains("LinkedIn"));
    }

    #[tokio::test]
    async fn environment_key_enables_generation() {
        let provider = Arc::new(StubProvider::replying("from env"));
        let config = AppConfig {
            env_api_key: Some("env-key".to_string()),
            ..AppConfig::default()
        };
        let client = GenerationClient::new(gateway(provider.clone(), None, config).await);

        assert_eq!(client.generate("AI", ContentType::Blog).await.text(), "from env");
    }

    #[tokio::test]
    async fn transport_error_becomes_failed_text() {
        let provider = Arc::new(StubProvider::failing("timeout"));
        let client = GenerationClient::new(gateway(provider, Some("k"), no_env_key()).await);

        let outcome = client.generate("AI", ContentType::Email).await;

        assert!(matches!(outcome, GenerationOutcome::Failed(_)));
        assert!(outcome.text().contains("timeout"));
        assert_eq!(outcome.archive_status(), Some(ContentStatus::Failed));
    }

    #[tokio::test]
    async fn empty_reply_maps_to_fixed_message() {
        let provider = Arc::new(StubProvider::replying("   "));
        let client = GenerationClient::new(gateway(provider, Some("k"), no_env_key()).await);

        let outcome = client.generate("AI", ContentType::Twitter).await;
        assert_eq!(outcome, GenerationOutcome::Failed(EMPTY_GENERATION_MESSAGE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = Arc::new(StubProvider::replying("late").delayed(Duration::from_secs(60)));
        let config = AppConfig {
            request_timeout: Duration::from_secs(30),
            ..no_env_key()
        };
        let client = GenerationClient::new(gateway(provider, Some("k"), config).await);

        let outcome = client.generate("AI", ContentType::Blog).await;
        assert_eq!(
            outcome,
            GenerationOutcome::Failed("ERROR: Request timed out after 30s".to_string())
        );
    }

    #[tokio::test]
    async fn summarizer_diagnostics() {
        let offline = TrendSummarizer::new(
            gateway(Arc::new(StubProvider::replying("x")), None, no_env_key()).await,
        );
        assert_eq!(offline.summarize("ctx").await, INSIGHT_OFFLINE_MESSAGE);

        let broken = TrendSummarizer::new(
            gateway(Arc::new(StubProvider::failing("boom")), Some("k"), no_env_key()).await,
        );
        assert_eq!(broken.summarize("ctx").await, INSIGHT_INTERRUPTED_MESSAGE);

        let empty = TrendSummarizer::new(
            gateway(Arc::new(StubProvider::replying("")), Some("k"), no_env_key()).await,
        );
        assert_eq!(empty.summarize("ctx").await, INSIGHT_EMPTY_MESSAGE);
    }

    #[tokio::test]
    async fn summarizer_passes_context_into_prompt() {
        let provider = Arc::new(StubProvider::replying("Organic growth leads."));
        let summarizer =
            TrendSummarizer::new(gateway(provider.clone(), Some("k"), no_env_key()).await);

        assert_eq!(summarizer.summarize("45% growth").await, "Organic growth leads.");
        assert!(provider.last_prompt().await.unwrap().contains("45% growth"));
    }
}
