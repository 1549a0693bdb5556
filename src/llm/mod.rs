//! Provider-neutral completion layer.
//!
//! Callers hand a [`Prompt`] and a [`ModelChoice`] to [`LlmClient::complete`]; the
//! adapter for the model's provider family builds the wire request, and the answer
//! comes back as a [`Completion`] with usage already normalized.

pub mod anthropic;
pub mod openai;
pub mod resolver;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::usage::TokenUsage;

pub use resolver::{ModelChoice, ProviderKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// One block of a messages-style response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: "text".into(), text: Some(text.into()) }
    }
}

/// Completion text as returned by the provider: a plain string or a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Flattens blocks into one string. Non-text blocks are rendered as JSON.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|block| match &block.text {
                    Some(text) => text.clone(),
                    None => serde_json::to_string(block).unwrap_or_default(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .all(|b| b.text.as_deref().map_or(true, |t| t.trim().is_empty())),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: MessageContent,
    pub usage: TokenUsage,
}

/// What a stage wants to ask, independent of provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub json_object: bool,
}

impl Prompt {
    pub fn new(user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens,
            temperature: 0.3,
            json_object: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    /// System text folded into the user turn, for providers without a system role.
    pub(crate) fn single_turn(&self) -> String {
        match &self.system {
            Some(system) => format!("{}\n\n{}", system, self.user),
            None => self.user.clone(),
        }
    }
}

/// Transport for the two wire protocols. The HTTP implementation talks to the
/// real APIs; tests substitute a scripted one.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat_completion(&self, request: &openai::ChatRequest) -> Result<openai::ChatResponse>;

    async fn create_message(
        &self,
        request: &anthropic::MessagesRequest,
    ) -> Result<anthropic::MessagesResponse>;
}

pub struct HttpBackend {
    client: Client,
    openai_api_key: String,
    openai_base_url: String,
    anthropic_api_key: String,
    anthropic_base_url: String,
}

impl HttpBackend {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            openai_api_key: config.openai_api_key.clone(),
            openai_base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            anthropic_api_key: config.anthropic_api_key.clone(),
            anthropic_base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LlmBackend for HttpBackend {
    async fn chat_completion(&self, request: &openai::ChatRequest) -> Result<openai::ChatResponse> {
        openai::send(&self.client, &self.openai_base_url, &self.openai_api_key, request).await
    }

    async fn create_message(
        &self,
        request: &anthropic::MessagesRequest,
    ) -> Result<anthropic::MessagesResponse> {
        anthropic::send(
            &self.client,
            &self.anthropic_base_url,
            &self.anthropic_api_key,
            request,
        )
        .await
    }
}

#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn LlmBackend>,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Dispatches on the model's provider family. Blank content is an
    /// `InvalidResponse` error regardless of provider.
    pub async fn complete(&self, model: &ModelChoice, prompt: &Prompt) -> Result<Completion> {
        debug!(
            model = %model.provider_id,
            provider = ?model.provider,
            prompt_chars = prompt.user.len(),
            "Sending completion request"
        );

        let completion = match model.provider {
            ProviderKind::Chat => {
                let request = openai::chat_request(&model.provider_id, prompt);
                openai::into_completion(self.backend.chat_completion(&request).await?)?
            }
            ProviderKind::Reasoning => {
                let request = openai::reasoning_request(&model.provider_id, prompt);
                openai::into_completion(self.backend.chat_completion(&request).await?)?
            }
            ProviderKind::Messages => {
                let request = anthropic::messages_request(&model.provider_id, prompt);
                anthropic::into_completion(self.backend.create_message(&request).await?)?
            }
        };

        if completion.content.is_blank() {
            return Err(AppError::InvalidResponse(format!(
                "Empty content from {}",
                model.provider_id
            )));
        }

        Ok(completion)
    }
}
