#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use article_pipeline::config::Config;
use article_pipeline::error::{AppError, Result};
use article_pipeline::llm::anthropic::{MessagesRequest, MessagesResponse};
use article_pipeline::llm::openai::{ChatRequest, ChatResponse};
use article_pipeline::llm::{LlmBackend, LlmClient};
use article_pipeline::publish::Publisher;
use article_pipeline::scraper::{SearchHit, WebSource};

pub const ARTICLE_TEXT: &str =
    "# Rust Ownership\n\nOwnership keeps memory safe.\n\n## Key Takeaways\n\n- Values have one owner.";

pub const ANALYSIS_JSON: &str = r#"{
    "mainTopics": ["Ownership in Rust"],
    "concepts": ["borrowing", "moves"],
    "technologies": ["rustc"],
    "applications": ["systems programming"]
}"#;

pub fn request_text(request: &ChatRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn is_summary(text: &str) -> bool {
    text.contains("CONTENT TO SUMMARIZE")
}

pub fn is_article(text: &str) -> bool {
    text.contains("Write an engaging web article")
}

pub fn is_analysis(request: &ChatRequest) -> bool {
    request.response_format.is_some()
}

/// Answers by stage: summaries pop from a queue, analysis and article replies are fixed.
pub struct ScriptedBackend {
    summary_replies: Mutex<VecDeque<(String, u64, u64)>>,
    pub analysis_reply: Mutex<(String, u64, u64)>,
    pub article_reply: Mutex<(String, u64, u64)>,
    pub title_reply: (String, u64, u64),
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub message_requests: Mutex<Vec<MessagesRequest>>,
}

impl ScriptedBackend {
    pub fn new(summaries: Vec<(&str, u64, u64)>) -> Self {
        Self {
            summary_replies: Mutex::new(
                summaries
                    .into_iter()
                    .map(|(text, p, c)| (text.to_string(), p, c))
                    .collect(),
            ),
            analysis_reply: Mutex::new((ANALYSIS_JSON.to_string(), 50, 20)),
            article_reply: Mutex::new((ARTICLE_TEXT.to_string(), 1000, 500)),
            title_reply: ("- Rust Ownership Explained".to_string(), 30, 15),
            chat_requests: Mutex::new(Vec::new()),
            message_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_article(self, text: &str, prompt_tokens: u64, completion_tokens: u64) -> Self {
        *self.article_reply.lock().unwrap() = (text.to_string(), prompt_tokens, completion_tokens);
        self
    }

    pub fn with_analysis(self, text: &str) -> Self {
        *self.analysis_reply.lock().unwrap() = (text.to_string(), 50, 20);
        self
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn message_requests(&self) -> Vec<MessagesRequest> {
        self.message_requests.lock().unwrap().clone()
    }

    pub fn analysis_calls(&self) -> usize {
        self.chat_requests().iter().filter(|r| is_analysis(r)).count()
    }

    fn reply_for(&self, text: &str, json: bool) -> Result<(String, u64, u64)> {
        if json {
            return Ok(self.analysis_reply.lock().unwrap().clone());
        }
        if is_summary(text) {
            return self
                .summary_replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AppError::LlmError("no scripted summary left".into()));
        }
        if is_article(text) {
            return Ok(self.article_reply.lock().unwrap().clone());
        }
        Ok(self.title_reply.clone())
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat_requests.lock().unwrap().push(request.clone());
        let (text, prompt, completion) =
            self.reply_for(&request_text(request), is_analysis(request))?;
        Ok(ChatResponse::with_content(text, prompt, completion))
    }

    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        self.message_requests.lock().unwrap().push(request.clone());
        let text = &request.messages[0].content;
        let (text, input, output) = self.reply_for(text, false)?;
        Ok(MessagesResponse::with_text(text, input, output))
    }
}

/// Search results per keyword and page bodies per URL. Unknown URLs fail to fetch.
#[derive(Default)]
pub struct StaticWeb {
    pub results: HashMap<String, Vec<SearchHit>>,
    pub pages: HashMap<String, String>,
}

impl StaticWeb {
    pub fn with_result(mut self, keyword: &str, title: &str, url: &str) -> Self {
        self.results.entry(keyword.to_string()).or_default().push(SearchHit {
            title: title.to_string(),
            url: url.to_string(),
        });
        self
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl WebSource for StaticWeb {
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        Ok(self.results.get(keyword).cloned().unwrap_or_default())
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::FetchError(format!("{} unreachable", url)))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub posts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, title: &str, content: &str) -> Result<()> {
        self.posts.lock().unwrap().push((title.to_string(), content.to_string()));
        Ok(())
    }
}

pub fn test_config(root: &Path, extra: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("SOURCES_DIR".into(), root.join("sources").display().to_string());
    env.insert("ARTICLES_DIR".into(), root.join("articles").display().to_string());
    env.insert("KEYWORDS_DIR".into(), root.join("keywords").display().to_string());
    for (key, value) in extra {
        env.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| env.get(key).cloned()).expect("test config")
}

pub fn client(backend: &Arc<ScriptedBackend>) -> LlmClient {
    LlmClient::new(backend.clone())
}

pub fn page(body: &str) -> String {
    format!("<html><body><nav>skip me</nav><h1>Heading</h1><p>{}</p></body></html>", body)
}
