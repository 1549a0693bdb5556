use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Url};
use scraper::{Html, Selector};
use std::time::Duration;
use once_cell::sync::Lazy;
use tracing::debug;
use crate::error::{AppError, Result};

pub const MAX_CONTENT_CHARS: usize = 14_000;
pub const MAX_SEARCH_RESULTS: usize = 5;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .user_agent("Mozilla/5.0 (compatible; article-pipeline/0.1)")
        .timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|_| Client::new())
});

// Create static selectors to avoid recompiling them each time
static TEXT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("static selector")
});

static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".result__a").expect("static selector")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// Search and page retrieval, the two network collaborators of the collector
/// and the summarizer.
#[async_trait]
pub trait WebSource: Send + Sync {
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>>;

    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Scrapes the DuckDuckGo HTML endpoint.
#[derive(Debug, Default, Clone)]
pub struct DuckDuckGo;

#[async_trait]
impl WebSource for DuckDuckGo {
    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        let response = CLIENT
            .get(SEARCH_URL)
            .query(&[("q", keyword)])
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        let hits = parse_search_results(&html, MAX_SEARCH_RESULTS);
        debug!(keyword = %keyword, hits = hits.len(), "Search results parsed");
        Ok(hits)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        fetch_html(url).await
    }
}

pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::FetchError(format!("{}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(AppError::FetchError(format!("{} returned {}", url, response.status())));
    }
    let html = response.text().await?;
    Ok(html)
}

/// Result anchors carry a redirect link; the target is in its `uddg` parameter.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let url = decode_result_link(href)?;
            let title = anchor.text().collect::<String>().trim().to_string();
            Some(SearchHit { title, url })
        })
        .take(limit)
        .collect()
}

fn decode_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    match parsed.query_pairs().find(|(key, _)| key == "uddg") {
        Some((_, target)) => Some(target.into_owned()),
        None if parsed.domain().map_or(false, |d| !d.ends_with("duckduckgo.com")) => Some(absolute),
        None => None,
    }
}

/// Visible text of headings and paragraphs only, truncated to `max_chars`.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut result = String::new();
    for element in document.select(&TEXT_SELECTOR) {
        let text = element.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&text);
    }

    truncate_chars(&result, max_chars)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2Fch04-01-what-is-ownership.html&amp;rut=abc">What is <b>Ownership</b>?</a>
          </div>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fownership&amp;rut=def">Ownership explained</a>
          </div>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?rut=nothing">Broken</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_and_decodes_result_links() {
        let hits = parse_search_results(SEARCH_PAGE, MAX_SEARCH_RESULTS);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "What is Ownership?");
        assert_eq!(hits[0].url, "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html");
        assert_eq!(hits[1].url, "https://example.com/ownership");
    }

    #[test]
    fn respects_result_limit() {
        assert_eq!(parse_search_results(SEARCH_PAGE, 1).len(), 1);
    }

    #[test]
    fn extracts_headings_and_paragraphs_only() {
        let html = r#"
            <html><head><title>Ignored</title><script>var x = 1;</script></head>
            <body>
              <nav>Menu items</nav>
              <h1>Ownership</h1>
              <p>Each value has an   owner.</p>
              <div>Sidebar text</div>
              <h2>Borrowing</h2>
              <p>References borrow values.</p>
            </body></html>
        "#;
        let text = extract_text(html, MAX_CONTENT_CHARS);
        assert_eq!(
            text,
            "Ownership\nEach value has an owner.\nBorrowing\nReferences borrow values."
        );
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");

        let long_page = format!("<p>{}</p>", "a".repeat(MAX_CONTENT_CHARS + 500));
        assert_eq!(extract_text(&long_page, MAX_CONTENT_CHARS).chars().count(), MAX_CONTENT_CHARS);
    }
}
