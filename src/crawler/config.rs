//! # Crawler Configuration Module
//!
//! Configuration for page fetching and scraping, built with the same
//! builder pattern used by the other configuration structs in the crate.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Fetch concurrency, timeouts, politeness and text extraction settings
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//! - `TextSource`: Which part of the page feeds the embedding model

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which text of a page is extracted for embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSource {
    /// All text left after removing boilerplate elements
    #[default]
    Visible,
    /// Only the text of `<p>` elements
    Paragraphs,
}

impl FromStr for TextSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "visible" => Ok(Self::Visible),
            "paragraphs" | "p" => Ok(Self::Paragraphs),
            other => Err(format!("unknown text source: {}", other)),
        }
    }
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Paragraphs => write!(f, "paragraphs"),
        }
    }
}

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched at the same time
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Delay in milliseconds each worker waits before a request
    pub rate_limit_ms: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// Which text of a page is extracted
    pub text_source: TextSource,

    /// CSS selectors for elements removed before extracting visible text
    pub exclude_selectors: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 5,
            rate_limit_ms: 0,
            user_agent: format!("interlink/{}", env!("CARGO_PKG_VERSION")),
            text_source: TextSource::default(),
            exclude_selectors: vec![
                "script".to_string(),
                "style".to_string(),
                "noscript".to_string(),
                "template".to_string(),
                "footer".to_string(),
                "header".to_string(),
                "nav".to_string(),
                "aside".to_string(),
            ],
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the number of concurrent fetches (at least one)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the delay in milliseconds before each request
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set which text of a page is extracted
    pub fn text_source(mut self, text_source: TextSource) -> Self {
        self.config.text_source = text_source;
        self
    }

    /// Set the CSS selectors for elements to exclude
    pub fn exclude_selectors(mut self, exclude_selectors: Vec<String>) -> Self {
        self.config.exclude_selectors = exclude_selectors;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrawlerConfig::default();

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.text_source, TextSource::Visible);
        assert!(config.exclude_selectors.contains(&"nav".to_string()));
        assert!(config.user_agent.starts_with("interlink/"));
    }

    #[test]
    fn test_builder() {
        let config = CrawlerConfig::builder()
            .concurrency(0)
            .timeout_secs(10)
            .rate_limit_ms(250)
            .user_agent("test-agent")
            .text_source(TextSource::Paragraphs)
            .build();

        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.rate_limit(), Duration::from_millis(250));
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.text_source, TextSource::Paragraphs);
    }

    #[test]
    fn test_text_source_from_str() {
        assert_eq!("visible".parse::<TextSource>(), Ok(TextSource::Visible));
        assert_eq!("Paragraphs".parse::<TextSource>(), Ok(TextSource::Paragraphs));
        assert!("everything".parse::<TextSource>().is_err());
    }
}
