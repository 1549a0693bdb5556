use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::PublishConfig;
use crate::error::{AppError, Result};

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, title: &str, content: &str) -> Result<()>;
}

#[derive(Serialize)]
struct PostRequest<'a> {
    title: &'a str,
    content: &'a str,
    status: &'a str,
}

/// Posts articles to a WordPress site through its REST API with basic auth.
pub struct WordPressPublisher {
    client: Client,
    config: PublishConfig,
}

impl WordPressPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/wp-json/wp/v2/posts", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    async fn publish(&self, title: &str, content: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&PostRequest {
                title,
                content,
                status: "publish",
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::FetchError(format!("Publish returned {}: {}", status, body)));
        }

        info!(title = %title, "Published article");
        Ok(())
    }
}

/// Publish errors are logged and never reach the caller.
pub async fn publish_quietly(publisher: &dyn Publisher, title: &str, content: &str) {
    if let Err(e) = publisher.publish(title, content).await {
        error!(title = %title, "Failed to publish article: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_posts_endpoint() {
        let publisher = WordPressPublisher::new(PublishConfig {
            url: "https://blog.example/".into(),
            username: "editor".into(),
            password: "secret".into(),
        });
        assert_eq!(publisher.endpoint(), "https://blog.example/wp-json/wp/v2/posts");
    }

    struct Failing;

    #[async_trait]
    impl Publisher for Failing {
        async fn publish(&self, _title: &str, _content: &str) -> Result<()> {
            Err(AppError::FetchError("down".into()))
        }
    }

    #[tokio::test]
    async fn publish_failures_are_swallowed() {
        publish_quietly(&Failing, "Title", "Body").await;
    }
}
