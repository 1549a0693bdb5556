//! Keyword-to-article orchestration.
//!
//! One keyword is processed end to end, strictly in sequence: collect sources,
//! summarize web pages one at a time, synthesize, then write and publish.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::cost::calculate_cost;
use crate::error::{AppError, Result};
use crate::llm::{HttpBackend, LlmClient, ModelChoice};
use crate::prompts::title_prompt;
use crate::publish::{publish_quietly, Publisher, WordPressPublisher};
use crate::relevance::{RelevanceAnalyzer, SourceAnalysis};
use crate::scraper::{DuckDuckGo, WebSource};
use crate::sources::{collect_local, collect_web, SourceDescriptor};
use crate::summarize::{SummaryResult, Summarizer};
use crate::synthesize::Synthesizer;
use crate::usage::RunUsageTotals;

pub const FAILED_KEYWORDS_DIR: &str = "failed";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub keyword: String,
    /// Directory name under the configured sources root.
    pub source_dir: Option<String>,
    pub web_search: bool,
    /// Synthesis model override; the configured default otherwise.
    pub model: Option<String>,
}

impl RunOptions {
    pub fn web(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            source_dir: None,
            web_search: true,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleReport {
    pub keyword: String,
    pub model: String,
    pub content: String,
    pub titles: Option<String>,
    pub output_path: PathBuf,
    pub usage: RunUsageTotals,
    pub sources_used: usize,
    /// Themes found in the local sources; `None` for web-only runs.
    pub analysis: Option<SourceAnalysis>,
    pub generated_at: DateTime<Utc>,
}

pub struct Pipeline {
    config: Arc<Config>,
    llm: LlmClient,
    web: Arc<dyn WebSource>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, llm: LlmClient, web: Arc<dyn WebSource>) -> Self {
        Self {
            config,
            llm,
            web,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Production wiring: HTTP providers, DuckDuckGo search, WordPress when enabled.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let llm = LlmClient::new(Arc::new(HttpBackend::from_config(&config)?));
        let publish = config.publish.clone();
        let pipeline = Self::new(config, llm, Arc::new(DuckDuckGo));

        Ok(match publish {
            Some(settings) => pipeline.with_publisher(Arc::new(WordPressPublisher::new(settings))),
            None => pipeline,
        })
    }

    async fn collect(&self, options: &RunOptions) -> Vec<SourceDescriptor> {
        let mut sources = Vec::new();

        if let Some(dir) = options.source_dir.as_deref() {
            sources.extend(collect_local(&self.config.sources_dir, dir));
        }

        if options.web_search {
            match collect_web(self.web.as_ref(), options.keyword.trim()).await {
                Ok(found) => sources.extend(found),
                Err(e) => warn!(keyword = %options.keyword, "Web search failed: {}", e),
            }
        }

        sources
    }

    pub async fn run(&self, options: &RunOptions) -> Result<ArticleReport> {
        let keyword = options.keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::ParseError("Please provide a keyword".to_string()));
        }
        info!("Processing keyword: {}", keyword);

        let sources = self.collect(options).await;
        if sources.is_empty() {
            info!("No results found. Something might be wrong with this keyword. Skipping...");
            return Err(AppError::NoResults(keyword.to_string()));
        }

        let mut totals = RunUsageTotals::default();
        let summarizer = Summarizer::new(
            self.llm.clone(),
            self.web.clone(),
            ModelChoice::new(self.config.summary_model.as_str()),
            self.config.limits.summary,
        );

        let mut summaries = Vec::with_capacity(sources.len());
        for source in &sources {
            if source.is_local {
                summaries.push(SummaryResult::local(source));
                continue;
            }
            let Some(url) = source.url.as_deref() else {
                continue;
            };
            info!("PROCESSING \"{} - {}\"", source.title, url);
            if let Some(summary) = summarizer.summarize(url).await {
                if let (Some(usage), Some(cost)) = (&summary.usage, &summary.cost) {
                    totals.record(usage, cost);
                }
                summaries.push(summary);
            }
        }

        let usable = summaries
            .iter()
            .filter(|s| !s.content.to_text().trim().is_empty())
            .count();
        if usable == 0 {
            warn!(keyword = %keyword, "Every source was dropped before synthesis");
            return Err(AppError::NoResults(keyword.to_string()));
        }
        info!("Summarized {} sources. Generating article...", usable);

        let model = ModelChoice::new(
            options
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
        );
        let analyzer = RelevanceAnalyzer::new(
            self.llm.clone(),
            ModelChoice::new(self.config.analysis_model.as_str()),
            self.config.limits.analysis,
        );
        let synthesizer = Synthesizer::new(self.llm.clone(), analyzer, self.config.limits.article);

        let article = synthesizer.synthesize(keyword, &summaries, &model).await?;
        totals.record(&article.usage, &article.cost);
        let content = article.content.to_text();

        let titles = if self.config.generate_titles {
            self.generate_titles(keyword, &mut totals).await
        } else {
            None
        };

        let output_path = write_article(
            &self.config.articles_dir,
            keyword,
            titles.as_deref(),
            &content,
        )?;
        info!("Article saved to {}", output_path.display());

        if let Some(publisher) = &self.publisher {
            publish_quietly(publisher.as_ref(), keyword, &content).await;
        }

        info!(
            input_tokens = totals.input_tokens,
            output_tokens = totals.output_tokens,
            cost = %format!("{:.4}", totals.cost),
            "DONE"
        );

        Ok(ArticleReport {
            keyword: keyword.to_string(),
            model: model.short_name,
            content,
            titles,
            output_path,
            usage: totals,
            sources_used: usable,
            analysis: article.analysis,
            generated_at: Utc::now(),
        })
    }

    /// Title suggestions are optional decoration; a failure only loses them.
    async fn generate_titles(&self, keyword: &str, totals: &mut RunUsageTotals) -> Option<String> {
        let model = ModelChoice::new(self.config.default_model.as_str());
        let prompt = title_prompt(keyword, self.config.limits.title);

        match self.llm.complete(&model, &prompt).await {
            Ok(completion) => {
                let usage = completion.usage;
                let cost = calculate_cost(
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    &model.short_name,
                );
                totals.record(&usage, &cost);
                let titles = completion.content.to_text();
                info!("Titles generated: \n{}", titles);
                Some(titles)
            }
            Err(e) => {
                error!("Title generation failed: {}", e);
                None
            }
        }
    }

    /// Processes the first keyword file in the keywords directory. The file is
    /// removed after a written article, or when the keyword found no sources.
    /// Any other failure moves it into the `failed/` subdirectory so the next
    /// keyword gets its turn.
    pub async fn run_next_keyword(&self) -> Result<Option<ArticleReport>> {
        let Some(path) = next_keyword_file(&self.config.keywords_dir)? else {
            debug!(dir = %self.config.keywords_dir.display(), "No keyword files waiting");
            return Ok(None);
        };
        let keyword = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = self.run(&RunOptions::web(keyword.as_str())).await;
        match &result {
            Ok(_) | Err(AppError::NoResults(_)) => {
                info!("Deleting keyword file {}", path.display());
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Could not delete keyword file {}: {}", path.display(), e);
                }
            }
            Err(err) => match set_aside(&path) {
                Ok(moved) => warn!(
                    keyword = %keyword,
                    "Keyword failed ({}), moved to {}", err, moved.display()
                ),
                Err(e) => warn!("Could not move keyword file {} aside: {}", path.display(), e),
            },
        }
        result.map(Some)
    }

    /// Runs keyword after keyword until the process is stopped.
    pub async fn watch(&self) {
        info!(
            dir = %self.config.keywords_dir.display(),
            interval_secs = self.config.loop_interval.as_secs(),
            "Watching keyword directory"
        );
        loop {
            if let Err(e) = self.run_next_keyword().await {
                error!("Keyword run failed: {}", e);
            }
            tokio::time::sleep(self.config.loop_interval).await;
        }
    }
}

fn next_keyword_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files.into_iter().next())
}

/// Moves a keyword file into `failed/` beside it; subdirectories are never picked up again.
fn set_aside(path: &Path) -> std::io::Result<PathBuf> {
    let dir = path
        .parent()
        .map(|parent| parent.join(FAILED_KEYWORDS_DIR))
        .unwrap_or_else(|| PathBuf::from(FAILED_KEYWORDS_DIR));
    fs::create_dir_all(&dir)?;
    let target = dir.join(path.file_name().unwrap_or_default());
    fs::rename(path, &target)?;
    Ok(target)
}

/// Keywords become file names; path separators are replaced.
pub fn article_file_name(keyword: &str) -> String {
    let name: String = keyword
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '-' } else { c })
        .collect();
    format!("{}.md", name)
}

fn write_article(
    dir: &Path,
    keyword: &str,
    titles: Option<&str>,
    content: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(article_file_name(keyword));
    let body = match titles {
        Some(titles) => format!("{}\n\n{}\n", titles.trim(), content.trim()),
        None => format!("{}\n", content.trim()),
    };
    fs::write(&path, body)?;
    Ok(path)
}
