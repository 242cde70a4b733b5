//! Configuration for sitemap extraction

/// Configuration for sitemap extraction
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    /// How many levels of sitemap indexes are followed
    pub max_depth: u32,

    /// URL path extensions that are never crawled
    pub skip_extensions: Vec<String>,

    /// Stop after this many URLs
    pub max_urls: Option<usize>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            skip_extensions: vec![".pdf".to_string()],
            max_urls: None,
        }
    }
}

/// Builder for SitemapConfig
#[derive(Debug, Default)]
pub struct SitemapConfigBuilder {
    config: SitemapConfig,
}

impl SitemapConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SitemapConfig::default(),
        }
    }

    /// Set how many levels of sitemap indexes are followed
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the skipped extensions
    pub fn skip_extensions(mut self, skip_extensions: Vec<String>) -> Self {
        self.config.skip_extensions = skip_extensions;
        self
    }

    /// Set the URL limit
    pub fn max_urls(mut self, max_urls: Option<usize>) -> Self {
        self.config.max_urls = max_urls;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SitemapConfig {
        self.config
    }
}

impl SitemapConfig {
    /// Create a new builder
    pub fn builder() -> SitemapConfigBuilder {
        SitemapConfigBuilder::new()
    }
}
