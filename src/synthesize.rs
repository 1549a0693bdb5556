use tracing::{debug, error, info};

use crate::cost::{calculate_cost, CostBreakdown};
use crate::error::Result;
use crate::llm::{LlmClient, MessageContent, ModelChoice};
use crate::prompts::{article_prompt, PromptConfig};
use crate::relevance::{RelevanceAnalyzer, SourceAnalysis};
use crate::summarize::SummaryResult;
use crate::usage::TokenUsage;

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub content: MessageContent,
    pub usage: TokenUsage,
    pub cost: CostBreakdown,
    pub analysis: Option<SourceAnalysis>,
}

pub struct Synthesizer {
    llm: LlmClient,
    analyzer: RelevanceAnalyzer,
    max_tokens: u32,
}

/// Local texts with blank entries removed, and `Source: <url>` web blocks.
pub fn partition_sources(summaries: &[SummaryResult]) -> (Vec<String>, Vec<String>) {
    let local = summaries
        .iter()
        .filter(|s| s.is_local)
        .map(|s| s.content.to_text())
        .filter(|text| !text.trim().is_empty())
        .collect();

    let web = summaries
        .iter()
        .filter(|s| !s.is_local)
        .filter_map(|s| {
            let text = s.content.to_text();
            match &s.source {
                Some(url) if !text.trim().is_empty() => Some(format!("Source: {}\n{}", url, text)),
                _ => None,
            }
        })
        .collect();

    (local, web)
}

impl Synthesizer {
    pub fn new(llm: LlmClient, analyzer: RelevanceAnalyzer, max_tokens: u32) -> Self {
        Self {
            llm,
            analyzer,
            max_tokens,
        }
    }

    /// Errors here are fatal for the keyword: no retry, no partial article.
    pub async fn synthesize(
        &self,
        topic: &str,
        summaries: &[SummaryResult],
        model: &ModelChoice,
    ) -> Result<Article> {
        info!("Starting article generation with {} summaries", summaries.len());

        let (local_sources, web_sources) = partition_sources(summaries);
        let has_local_sources = !local_sources.is_empty();
        info!(
            local = local_sources.len(),
            web = web_sources.len(),
            "Found {} valid local sources",
            local_sources.len()
        );

        let analysis = if has_local_sources {
            Some(self.analyzer.analyze(topic, &local_sources).await)
        } else {
            None
        };

        let config = PromptConfig {
            has_local_sources,
            provider: model.provider,
        };
        let prompt = article_prompt(
            config,
            topic,
            &local_sources,
            &web_sources,
            analysis.as_ref(),
            self.max_tokens,
        );
        debug!(prompt_chars = prompt.user.len(), "Built synthesis prompt");

        info!("Using {} ({}) for article generation", model.provider_id, model.short_name);
        let completion = self.llm.complete(model, &prompt).await.map_err(|e| {
            error!("Error in article generation: {}", e);
            e
        })?;

        let usage = completion.usage;
        let cost = calculate_cost(usage.prompt_tokens, usage.completion_tokens, &model.short_name);
        info!("Generated article length: {} characters", completion.content.to_text().len());

        Ok(Article {
            content: completion.content,
            usage,
            cost,
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web(url: &str, text: &str) -> SummaryResult {
        SummaryResult {
            content: MessageContent::Text(text.into()),
            source: Some(url.into()),
            is_local: false,
            usage: None,
            cost: None,
        }
    }

    fn local(text: &str) -> SummaryResult {
        SummaryResult {
            content: MessageContent::Text(text.into()),
            source: None,
            is_local: true,
            usage: None,
            cost: None,
        }
    }

    #[test]
    fn blank_local_sources_are_dropped() {
        let (local_sources, web_sources) = partition_sources(&[
            local("   \n"),
            local("Notes"),
            web("https://a.example", "Summary"),
        ]);
        assert_eq!(local_sources, vec!["Notes"]);
        assert_eq!(web_sources, vec!["Source: https://a.example\nSummary"]);
    }

    #[test]
    fn web_blocks_are_flattened() {
        let summary = SummaryResult {
            content: MessageContent::Blocks(vec![crate::llm::ContentBlock::text("Block text")]),
            ..web("https://b.example", "")
        };
        let (_, web_sources) = partition_sources(&[summary]);
        assert_eq!(web_sources, vec!["Source: https://b.example\nBlock text"]);
    }
}
