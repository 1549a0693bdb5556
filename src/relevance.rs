use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::llm::{LlmClient, ModelChoice};
use crate::prompts::analysis_prompt;

/// Themes extracted from the local sources, used to steer synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceAnalysis {
    pub main_topic: String,
    pub concepts: Vec<String>,
    pub technologies: Vec<String>,
    pub applications: Vec<String>,
    pub is_relevant: bool,
    pub suggested_focus: String,
}

impl SourceAnalysis {
    pub fn fallback(topic: &str) -> Self {
        Self {
            main_topic: topic.to_string(),
            concepts: Vec::new(),
            technologies: Vec::new(),
            applications: Vec::new(),
            is_relevant: true,
            suggested_focus: format!("Analyzing {} using available source materials", topic),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawAnalysis {
    main_topics: Vec<String>,
    concepts: Vec<String>,
    technologies: Vec<String>,
    applications: Vec<String>,
}

pub struct RelevanceAnalyzer {
    llm: LlmClient,
    model: ModelChoice,
    max_tokens: u32,
}

impl RelevanceAnalyzer {
    pub fn new(llm: LlmClient, model: ModelChoice, max_tokens: u32) -> Self {
        Self { llm, model, max_tokens }
    }

    /// Never fails: call or parse errors degrade to [`SourceAnalysis::fallback`].
    pub async fn analyze(&self, topic: &str, local_sources: &[String]) -> SourceAnalysis {
        match self.try_analyze(topic, local_sources).await {
            Ok(analysis) => {
                info!(
                    is_relevant = analysis.is_relevant,
                    main_topic = %analysis.main_topic,
                    concepts = ?analysis.concepts,
                    technologies = ?analysis.technologies,
                    "Source analysis complete"
                );
                analysis
            }
            Err(e) => {
                error!("Error analyzing source relevance: {}", e);
                SourceAnalysis::fallback(topic)
            }
        }
    }

    async fn try_analyze(&self, topic: &str, local_sources: &[String]) -> Result<SourceAnalysis> {
        let prompt = analysis_prompt(local_sources, self.max_tokens);
        let completion = self.llm.complete(&self.model, &prompt).await?;
        info!(
            model = %self.model.short_name,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "Relevance analysis usage"
        );
        parse_analysis(topic, &completion.content.to_text()).inspect_err(|_| {
            if completion.usage.completion_tokens >= u64::from(self.max_tokens) {
                warn!(
                    max_tokens = self.max_tokens,
                    "Source analysis reply reached its token cap and was likely cut off"
                );
            }
        })
    }
}

pub fn parse_analysis(topic: &str, response: &str) -> Result<SourceAnalysis> {
    let raw: RawAnalysis = serde_json::from_str(strip_code_fence(response))
        .map_err(|e| AppError::ParseError(format!("Source analysis is not valid JSON: {}", e)))?;

    if raw.main_topics.is_empty() && raw.concepts.is_empty() && raw.technologies.is_empty() {
        warn!("Source analysis returned no themes");
    }

    let is_relevant = topic_overlaps(topic, &raw);
    let topics = raw.main_topics.join(", ");
    let suggested_focus = if is_relevant {
        format!(
            "These sources discuss {}, which relate to {} through shared concepts in {}",
            topics,
            topic,
            raw.concepts.join(", ")
        )
    } else {
        format!(
            "While these sources focus on {}, they contain relevant technological and \
             conceptual frameworks that can inform our understanding of {}",
            topics, topic
        )
    };

    Ok(SourceAnalysis {
        main_topic: raw.main_topics.join("; "),
        concepts: raw.concepts,
        technologies: raw.technologies,
        applications: raw.applications,
        is_relevant,
        suggested_focus,
    })
}

/// Any whitespace-separated topic term (case-insensitive) appearing inside a
/// main topic, concept, or technology.
fn topic_overlaps(topic: &str, raw: &RawAnalysis) -> bool {
    let terms: Vec<String> = topic.split_whitespace().map(str::to_lowercase).collect();
    let themes: Vec<String> = raw
        .main_topics
        .iter()
        .chain(&raw.concepts)
        .chain(&raw.technologies)
        .map(|theme| theme.to_lowercase())
        .collect();

    terms
        .iter()
        .any(|term| themes.iter().any(|theme| theme.contains(term.as_str())))
}

fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
