//! Completion provider client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol. The HTTP
//! client is one implementation of [`CompletionService`]; tests and offline
//! sessions plug in their own.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use folio_core::config::LlmConfig;

use crate::error::CompletionError;

/// Role of a prompt message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered prompt: system message, prior turns, then the new user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
}

/// Anything that can turn a prompt into a reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

// OpenAI-compatible wire types
#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible completion endpoint.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: Option<String>,
    api_key_env: String,
}

impl HttpCompletionClient {
    /// Build a client from config, reading the bearer token from the
    /// environment variable named in `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "No completion API key set; chat replies will be unavailable");
        }
        Self::new(config, api_key)
    }

    /// Build a client with an explicit key.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
            api_key_env: config.api_key_env.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::MissingApiKey(self.api_key_env.clone()))?;

        let body = ChatRequestBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(url = %self.url, turns = request.messages.len(), "Sending completion request");

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponseBody = res
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Decode("response has no completion text".to_string()))
    }
}
