use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::pipeline::{ArticleReport, RunOptions};
use crate::relevance::SourceAnalysis;
use crate::usage::RunUsageTotals;

fn default_web_search() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuery {
    /// Comma-separated keyword list.
    pub keywords: String,
    pub source_dir: Option<String>,
    #[serde(default = "default_web_search")]
    pub web_search: bool,
    pub model: Option<String>,
}

impl GenerateQuery {
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn run_options(&self, keyword: &str) -> RunOptions {
        RunOptions {
            keyword: keyword.to_string(),
            source_dir: self.source_dir.clone().filter(|d| !d.trim().is_empty()),
            web_search: self.web_search,
            model: self.model.clone().filter(|m| !m.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub keyword: String,
    pub model: String,
    #[serde(rename = "article_markdown")]
    pub article: String,
    pub titles: Option<String>,
    pub output_path: String,
    pub usage: RunUsageTotals,
    pub sources_used: usize,
    pub word_count: usize,
    pub analysis: Option<SourceAnalysis>,
    pub generated_at: DateTime<Utc>,
}

impl From<ArticleReport> for ArticleResponse {
    fn from(report: ArticleReport) -> Self {
        Self {
            word_count: report.content.split_whitespace().count(),
            keyword: report.keyword,
            model: report.model,
            article: report.content,
            titles: report.titles,
            output_path: report.output_path.display().to_string(),
            usage: report.usage,
            sources_used: report.sources_used,
            analysis: report.analysis,
            generated_at: report.generated_at,
        }
    }
}
