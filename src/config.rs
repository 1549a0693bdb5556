use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Per-stage completion caps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenLimits {
    pub title: u32,
    pub article: u32,
    pub summary: u32,
    /// Relevance analysis reply; a truncated JSON object degrades to the fallback analysis.
    pub analysis: u32,
}

impl Default for TokenLimits {
    fn default() -> Self {
        Self {
            title: 200,
            article: 4000,
            summary: 1000,
            analysis: 1500,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PublishConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub default_model: String,
    pub summary_model: String,
    pub analysis_model: String,
    pub limits: TokenLimits,
    pub generate_titles: bool,
    pub sources_dir: PathBuf,
    pub articles_dir: PathBuf,
    pub keywords_dir: PathBuf,
    pub loop_interval: Duration,
    /// `None` when publishing is disabled.
    pub publish: Option<PublishConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let host = or("HOST", "127.0.0.1");
        let port = or("PORT", "5129");
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let defaults = TokenLimits::default();
        let limits = TokenLimits {
            title: parse_or(get("TITLE_MAX_TOKENS"), "TITLE_MAX_TOKENS", defaults.title)?,
            article: parse_or(get("ARTICLE_MAX_TOKENS"), "ARTICLE_MAX_TOKENS", defaults.article)?,
            summary: parse_or(get("SUMMARY_MAX_TOKENS"), "SUMMARY_MAX_TOKENS", defaults.summary)?,
            analysis: parse_or(
                get("ANALYSIS_MAX_TOKENS"),
                "ANALYSIS_MAX_TOKENS",
                defaults.analysis,
            )?,
        };

        let publish = if parse_flag(get("PUBLISH_ENABLED"), "PUBLISH_ENABLED")? {
            let required = |key: &str| {
                get(key).ok_or_else(|| {
                    AppError::ConfigError(format!(
                        "{} is required when PUBLISH_ENABLED is set",
                        key
                    ))
                })
            };
            Some(PublishConfig {
                url: required("WP_URL")?,
                username: required("WP_USERNAME")?,
                password: required("WP_PASSWORD")?,
            })
        } else {
            None
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            openai_api_key: or("OPENAI_API_KEY", ""),
            anthropic_api_key: or("ANTHROPIC_API_KEY", ""),
            openai_base_url: or("OPENAI_BASE_URL", OPENAI_BASE_URL),
            anthropic_base_url: or("ANTHROPIC_BASE_URL", ANTHROPIC_BASE_URL),
            default_model: or("OPENAI_MODEL", DEFAULT_MODEL),
            summary_model: or("SUMMARY_MODEL", DEFAULT_MODEL),
            analysis_model: or("ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
            limits,
            generate_titles: parse_flag(get("GENERATE_TITLES"), "GENERATE_TITLES")?,
            sources_dir: PathBuf::from(or("SOURCES_DIR", "./sources")),
            articles_dir: PathBuf::from(or("ARTICLES_DIR", "./articles")),
            keywords_dir: PathBuf::from(or("KEYWORDS_DIR", "./keywords")),
            loop_interval: Duration::from_secs(parse_or(
                get("LOOP_INTERVAL_SECS"),
                "LOOP_INTERVAL_SECS",
                5,
            )?),
            publish,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, key: &str) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::ConfigError(format!(
                "Invalid {}: expected a boolean, got {}",
                key, v
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_addr.port(), 5129);
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.summary_model, "gpt-4o");
        assert_eq!(config.limits, TokenLimits::default());
        assert!(config.publish.is_none());
        assert!(!config.generate_titles);
        assert_eq!(config.loop_interval, Duration::from_secs(5));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("OPENAI_MODEL", "o1-mini"),
            ("SUMMARY_MODEL", "claude-3-5-haiku"),
            ("ARTICLE_MAX_TOKENS", "8000"),
            ("ANALYSIS_MAX_TOKENS", "2500"),
            ("GENERATE_TITLES", "true"),
        ])
        .unwrap();
        assert_eq!(config.server_addr.port(), 8080);
        assert_eq!(config.default_model, "o1-mini");
        assert_eq!(config.summary_model, "claude-3-5-haiku");
        assert_eq!(config.limits.article, 8000);
        assert_eq!(config.limits.analysis, 2500);
        assert_eq!(config.limits.summary, 1000);
        assert!(config.generate_titles);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(config_from(&[("PORT", "nope")]), Err(AppError::ConfigError(_))));
        assert!(matches!(
            config_from(&[("SUMMARY_MAX_TOKENS", "-3")]),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(config_from(&[("HOST", "not-an-ip")]), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn publishing_requires_credentials() {
        let err = config_from(&[("PUBLISH_ENABLED", "1"), ("WP_URL", "https://blog.example")])
            .unwrap_err();
        assert!(err.to_string().contains("WP_USERNAME"));

        let config = config_from(&[
            ("PUBLISH_ENABLED", "1"),
            ("WP_URL", "https://blog.example"),
            ("WP_USERNAME", "editor"),
            ("WP_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(config.publish.unwrap().username, "editor");
    }
}
