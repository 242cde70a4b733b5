//! Error types for the sitemap module

use crate::crawler::CrawlError;
use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for sitemap operations
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The sitemap could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] CrawlError),

    /// The sitemap URL is invalid
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// Well-formed XML whose root is neither `urlset` nor `sitemapindex`
    #[error("Not a sitemap: root element is <{0}>")]
    NotASitemap(String),
}

impl From<SitemapError> for CrateError {
    fn from(err: SitemapError) -> Self {
        match err {
            SitemapError::Fetch(e) => e.into(),
            _ => CrateError::Sitemap(err.to_string()),
        }
    }
}
