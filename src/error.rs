//! Error types for the interlink crate

use thiserror::Error;

/// Result type for interlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for interlink operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page fetching or scraping error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Sitemap retrieval or parsing error
    #[error("Sitemap error: {0}")]
    Sitemap(String),

    /// Embedding generation or embedding file error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Similarity search error
    #[error("Search error: {0}")]
    Search(String),

    /// CSV/JSON export error
    #[error("Export error: {0}")]
    Export(String),

    /// Response cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlError;
    use crate::embedder::EmbedError;
    use crate::search::SearchError;
    use crate::sitemap::SitemapError;

    fn fail<E: Into<Error>>(err: E) -> Result<()> {
        Err(err.into())
    }

    #[test]
    fn test_module_errors_convert() {
        assert!(matches!(
            fail(SearchError::UrlNotFound("https://example.com/".to_string())),
            Err(Error::Search(msg)) if msg.contains("https://example.com/")
        ));
        assert!(matches!(
            fail(SitemapError::Fetch(CrawlError::Status {
                url: "https://example.com/sitemap.xml".to_string(),
                status: 404,
            })),
            Err(Error::Crawl(msg)) if msg.contains("404")
        ));
        assert!(matches!(
            fail(SitemapError::Xml("unexpected end".to_string())),
            Err(Error::Sitemap(_))
        ));
        assert!(matches!(
            fail(EmbedError::MissingApiKey("GEMINI_API_KEY".to_string())),
            Err(Error::Embedding(msg)) if msg == "GEMINI_API_KEY environment variable must be set"
        ));
        assert!(matches!(
            fail(CrawlError::UrlParse(url::ParseError::EmptyHost)),
            Err(Error::Other(_))
        ));
    }
}
