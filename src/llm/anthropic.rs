use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{ChatMessage, Completion, ContentBlock, MessageContent, Prompt};
use crate::error::{AppError, Result};
use crate::usage::TokenUsage;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: MessagesUsage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct MessagesUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl MessagesResponse {
    pub fn with_text(text: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            usage: MessagesUsage {
                input_tokens,
                output_tokens,
            },
        }
    }
}

pub fn messages_request(model_id: &str, prompt: &Prompt) -> MessagesRequest {
    MessagesRequest {
        model: model_id.to_string(),
        max_tokens: prompt.max_tokens,
        messages: vec![ChatMessage::user(prompt.single_turn())],
    }
}

/// Keeps the block list as-is and remaps `input_tokens`/`output_tokens`.
pub fn into_completion(response: MessagesResponse) -> Result<Completion> {
    let content = MessageContent::Blocks(response.content);
    if content.is_blank() {
        return Err(AppError::InvalidResponse("Messages response has no text content".to_string()));
    }

    Ok(Completion {
        content,
        usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
    })
}

pub(crate) async fn send(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &MessagesRequest,
) -> Result<MessagesResponse> {
    let res = client
        .post(format!("{}/messages", base_url))
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(request)
        .send()
        .await
        .map_err(|e| AppError::LlmError(format!("Messages request failed: {}", e)))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AppError::LlmError(format!("Failed to read messages body: {}", e)))?;

    if !status.is_success() {
        error!(status = %status, model = %request.model, body = %body, "Messages API error");
        return Err(AppError::LlmError(format!("Messages API returned {}: {}", status, body)));
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(model = %request.model, body = %body, "Unreadable messages response");
        AppError::InvalidResponse(format!("Malformed messages response: {}", e))
    })
}
