use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured")]
    ConfigurationMissing,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API returned empty content")]
    EmptyContent,

    #[error("{0}")]
    Transport(String),
}

// Trait defining the interface for text generation providers
#[async_trait]
pub trait GenerativeApiProvider: Send + Sync {
    /// Sends one prompt and returns the produced text. No retries, no streaming.
    async fn generate_text(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError>;
}

// --- OpenAI Compatible Provider Implementation ---

#[derive(Serialize, Debug)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
}

/// Calls any endpoint speaking the OpenAI chat-completions dialect
/// (Gemini exposes one under `/v1beta/openai`).
pub struct OpenAICompatibleProvider {
    client: Client,
    api_url: String,
    model: String,
}

impl OpenAICompatibleProvider {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            model: model.into(),
        }
    }

    fn request_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GenerativeApiProvider for OpenAICompatibleProvider {
    async fn generate_text(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let request_url = self.request_url();
        log::info!("Sending request to {} using model: {}", request_url, self.model);

        let request_body = ChatRequestBody {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(&request_url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<Failed to read error body>".to_string());
            log::error!("Generation request failed with status {}: {}", status, body);
            // Prefer the structured error message when the body carries one
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        log::debug!("Generation request succeeded ({} chars)", text.len());
        Ok(text)
    }
}
