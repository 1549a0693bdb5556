use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{ChatMessage, Completion, MessageContent, Prompt};
use crate::error::{AppError, Result};
use crate::usage::TokenUsage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct ChatUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ChatResponse {
    /// Convenience constructor for a single-choice response.
    pub fn with_content(
        content: impl Into<String>,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(content.into()),
                },
            }],
            usage: Some(ChatUsage {
                prompt_tokens,
                completion_tokens,
            }),
        }
    }
}

/// System + user turns, `max_tokens`, and the prompt's temperature.
pub fn chat_request(model_id: &str, prompt: &Prompt) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &prompt.system {
        messages.push(ChatMessage::system(system.as_str()));
    }
    messages.push(ChatMessage::user(prompt.user.as_str()));

    ChatRequest {
        model: model_id.to_string(),
        messages,
        max_tokens: Some(prompt.max_tokens),
        max_completion_tokens: None,
        temperature: Some(prompt.temperature),
        response_format: prompt.json_object.then(|| ResponseFormat {
            kind: "json_object".into(),
        }),
    }
}

/// Reasoning models accept neither a system role nor a temperature, and cap
/// output through `max_completion_tokens`.
pub fn reasoning_request(model_id: &str, prompt: &Prompt) -> ChatRequest {
    ChatRequest {
        model: model_id.to_string(),
        messages: vec![ChatMessage::user(prompt.single_turn())],
        max_tokens: None,
        max_completion_tokens: Some(prompt.max_tokens),
        temperature: None,
        response_format: None,
    }
}

pub fn into_completion(response: ChatResponse) -> Result<Completion> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            AppError::InvalidResponse("Missing choices[0].message.content".to_string())
        })?;

    let usage = response.usage.unwrap_or_default();

    Ok(Completion {
        content: MessageContent::Text(content),
        usage: TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
    })
}

pub(crate) async fn send(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<ChatResponse> {
    let res = client
        .post(format!("{}/chat/completions", base_url))
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| AppError::LlmError(format!("Chat completion request failed: {}", e)))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AppError::LlmError(format!("Failed to read chat completion body: {}", e)))?;

    if !status.is_success() {
        error!(status = %status, model = %request.model, body = %body, "Chat completion API error");
        return Err(AppError::LlmError(format!("Chat completion returned {}: {}", status, body)));
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(model = %request.model, body = %body, "Unreadable chat completion response");
        AppError::InvalidResponse(format!("Malformed chat completion response: {}", e))
    })
}
