//! Prompt templates for every stage.
//!
//! The article template is a single builder driven by [`PromptConfig`]; the
//! branches for local material and provider family live here and nowhere else.

use crate::llm::{Prompt, ProviderKind};
use crate::relevance::SourceAnalysis;

pub const MINIMUM_WORD_COUNT: usize = 1700;
pub const SOURCE_SEPARATOR: &str = "\n\n---\n\n";
pub const PRIMARY_SECTION: &str = "PRIMARY SOURCE MATERIALS";
pub const SUPPORTING_SECTION: &str = "SUPPORTING WEB RESEARCH";
pub const WEB_ONLY_SECTION: &str = "WEB RESEARCH MATERIALS";

const SUMMARY_PERSONA: &str = "You are an expert at creating concise, accurate summaries. Focus on extracting key facts and maintaining original context without inference or assumptions.";

const ARTICLE_PERSONA: &str = "You are an expert at creating engaging web content that makes complex topics accessible while maintaining strict source accuracy. You excel at drawing meaningful connections while clearly separating fact from analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptConfig {
    pub has_local_sources: bool,
    pub provider: ProviderKind,
}

pub fn summary_prompt(content: &str, max_tokens: u32) -> Prompt {
    let user = format!(
        r#"TASK: Create a detailed summary of the provided content.

OUTPUT REQUIREMENTS:
1. Extract key facts and events with their exact source
2. Preserve important quotes verbatim with attribution
3. Include specific dates and numbers exactly as stated
4. Maintain original context without inference
5. Focus on concrete details over analysis
6. For biographical information:
   - Only include facts explicitly stated in the source
   - Do not make assumptions about education, affiliations, or career paths
   - If information is unclear or missing, explicitly state that
   - Use qualifying language like "according to [source]" for each claim

CONTENT TO SUMMARIZE:
{content}"#
    );

    Prompt::new(user, max_tokens).with_system(SUMMARY_PERSONA)
}

pub fn analysis_prompt(local_sources: &[String], max_tokens: u32) -> Prompt {
    let user = format!(
        r#"TASK: Analyze these academic/technical source materials and extract their key themes and topics.

SOURCE MATERIALS:
{materials}

OUTPUT REQUIREMENTS:
1. Main Topics: List the primary topics/themes discussed across all sources
2. Key Concepts: Extract important theoretical frameworks and concepts
3. Technologies: Identify specific technologies, systems, or implementations mentioned
4. Applications: List concrete applications or use cases described

Format the output as JSON with these exact keys:
{{
  "mainTopics": [],
  "concepts": [],
  "technologies": [],
  "applications": []
}}"#,
        materials = local_sources.join(SOURCE_SEPARATOR)
    );

    Prompt::new(user, max_tokens).with_temperature(0.1).json_object()
}

pub fn title_prompt(keyword: &str, max_tokens: u32) -> Prompt {
    Prompt::new(
        format!("Generate 10 SEO-optimized titles for the following keyword: {keyword}. Return them as a Markdown list."),
        max_tokens,
    )
}

/// Local (primary) texts first, then `Source: <url>` web summaries.
pub fn article_prompt(
    config: PromptConfig,
    topic: &str,
    local_sources: &[String],
    web_sources: &[String],
    analysis: Option<&SourceAnalysis>,
    max_tokens: u32,
) -> Prompt {
    let primary = config.has_local_sources;

    let source_context = if primary {
        "SOURCE HIERARCHY:
1. PRIMARY SOURCES: Direct, authoritative materials that must be heavily quoted and prioritized
2. WEB SOURCES: Supporting information to provide additional context only"
    } else {
        "SOURCE CONTEXT:
All sources are from web research and should be treated with equal weight"
    };

    let source_requirements = if primary {
        "CRITICAL SOURCE REQUIREMENTS:
- Start with and heavily quote from PRIMARY SOURCE MATERIALS
- Use primary source framework and concepts as the foundation
- Each major section must begin with primary source content
- Only use web sources to supplement primary source information
- Maintain original terminology from primary sources
- Clearly mark any comparative analysis or connections
- If source material differs from the topic, explain how concepts relate
- Include explicit source attributions for all claims"
    } else {
        "SOURCE REQUIREMENTS:
- Use information only from provided web sources
- Include relevant quotes with proper attribution
- Maintain consistent terminology
- Clearly state when making interpretations
- Mark any uncertain information with qualifying language"
    };

    let guidance = match analysis.filter(|_| primary) {
        Some(analysis) => format!(
            "CONTENT APPROACH:
- Primary source focuses on: {main_topic}
- Key concepts to incorporate: {concepts}
- Suggested focus: {focus}
- Use these concepts as analytical framework when examining {topic}
- Draw connections while maintaining factual accuracy
- Clearly indicate when making comparative analyses",
            main_topic = analysis.main_topic,
            concepts = analysis.concepts.join(", "),
            focus = analysis.suggested_focus,
        ),
        None => "NOTE: Use available sources to:
- Identify relevant technological and conceptual parallels
- Compare methodological approaches
- Draw appropriate connections
- Maintain clear source attribution
- Be explicit about analytical scope"
            .to_string(),
    };

    let process_steps = if primary {
        "1. First analyze PRIMARY SOURCES to identify key themes and verified facts
2. Then review WEB SOURCES for supporting context
3. Organize information prioritizing PRIMARY SOURCE content"
    } else {
        "1. Analyze all sources to identify key themes and verified facts
2. Cross-reference information across multiple sources when possible
3. Organize information into a coherent narrative"
    };

    let materials = if primary {
        let supporting = if web_sources.is_empty() {
            "No web sources available".to_string()
        } else {
            format!("{SUPPORTING_SECTION}:\n{}", web_sources.join(SOURCE_SEPARATOR))
        };
        format!(
            "{PRIMARY_SECTION} (direct quotes and key ideas must be used from these):\n{}\n\n{}",
            local_sources.join(SOURCE_SEPARATOR),
            supporting
        )
    } else {
        format!("{WEB_ONLY_SECTION}:\n{}", web_sources.join(SOURCE_SEPARATOR))
    };

    let user = format!(
        r#"TASK: Write an engaging web article about {topic} based on the provided sources.

CONTEXT:
- Target audience: Web readers seeking informative, accessible content
- Purpose: Educate and inform while maintaining reader engagement
- Style: Conversational but authoritative

{source_context}

CRITICAL REQUIREMENTS:
{source_requirements}
- Only use information explicitly present in the provided source materials
- Do not infer, speculate, or fabricate details
- If the source materials do not mention specific facts, clearly state that the information is unavailable
- Each claim must be traceable to a specific source

{guidance}

PROCESS:
{process_steps}
4. Write in clear, accessible language while maintaining accuracy
5. Include relevant quotes with proper attribution
6. Structure content for web readability

OUTPUT REQUIREMENTS:
1. Format: Clean Markdown with clear section headers
2. Length: Minimum {MINIMUM_WORD_COUNT} words
3. Structure:
   - Engaging opening hook based on verified information
   - Clear section breaks with descriptive headers
   - Short, focused paragraphs
   - Natural transitions between ideas
   - Concluding "Key Takeaways" section

SOURCE MATERIALS:
{materials}

Begin by analyzing the sources, then write the article following the process above while strictly adhering to the critical requirements."#
    );

    let prompt = Prompt::new(user, max_tokens);
    // Only the chat family gets a separate persona turn.
    match config.provider {
        ProviderKind::Chat => prompt.with_system(ARTICLE_PERSONA),
        ProviderKind::Reasoning | ProviderKind::Messages => prompt,
    }
}
