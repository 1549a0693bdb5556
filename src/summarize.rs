use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::cost::{calculate_cost, CostBreakdown};
use crate::llm::{LlmClient, MessageContent, ModelChoice};
use crate::prompts::summary_prompt;
use crate::scraper::{extract_text, WebSource, MAX_CONTENT_CHARS};
use crate::sources::SourceDescriptor;
use crate::usage::TokenUsage;

/// Condensed form of one source. Local sources pass through with no usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub content: MessageContent,
    pub source: Option<String>,
    pub is_local: bool,
    pub usage: Option<TokenUsage>,
    pub cost: Option<CostBreakdown>,
}

impl SummaryResult {
    pub fn local(source: &SourceDescriptor) -> Self {
        Self {
            content: MessageContent::Text(source.content.clone().unwrap_or_default()),
            source: None,
            is_local: true,
            usage: None,
            cost: None,
        }
    }
}

pub struct Summarizer {
    llm: LlmClient,
    web: Arc<dyn WebSource>,
    model: ModelChoice,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(
        llm: LlmClient,
        web: Arc<dyn WebSource>,
        model: ModelChoice,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            web,
            model,
            max_tokens,
        }
    }

    /// `None` when the page cannot be fetched or the model call fails; the
    /// source is then dropped from the run.
    pub async fn summarize(&self, url: &str) -> Option<SummaryResult> {
        info!("SUMMARIZING {} with {} ...", url, self.model.short_name);

        let html = match self.web.fetch_page(url).await {
            Ok(html) => html,
            Err(e) => {
                info!("Error fetching {}. Skipping... ({})", url, e);
                return None;
            }
        };

        let content = extract_text(&html, MAX_CONTENT_CHARS);
        let prompt = summary_prompt(&content, self.max_tokens);

        match self.llm.complete(&self.model, &prompt).await {
            Ok(completion) => {
                let usage = completion.usage;
                // Priced by the short name the caller chose, not the provider identifier.
                let cost = calculate_cost(
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    &self.model.short_name,
                );
                Some(SummaryResult {
                    content: completion.content,
                    source: Some(url.to_string()),
                    is_local: false,
                    usage: Some(usage),
                    cost: Some(cost),
                })
            }
            Err(e) => {
                error!("Error summarizing content from {}: {}", url, e);
                None
            }
        }
    }
}
