pub mod api;
pub mod config;
pub mod cost;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod publish;
pub mod relevance;
pub mod scraper;
pub mod sources;
pub mod summarize;
pub mod synthesize;
pub mod usage;

use std::sync::Arc;
use pipeline::Pipeline;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}
