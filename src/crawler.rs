//! # Page Crawler Module
//!
//! This module fetches the pages listed in a sitemap and scrapes the SEO
//! metadata and body text used by the rest of the pipeline. It is the
//! "Page Scraper" stage that sits between the sitemap fetcher and the
//! embedder.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Fetch concurrency, timeouts, user agent and text extraction mode
//! - `Fetcher`: Bounded concurrent HTTP fetcher with an optional response cache
//! - `ResponseCache`: LibSQL-backed cache of page bodies with an expiry
//! - `CrawledPage` / `PageMetadata`: Per-page results
//! - `crawl_pages`: Fetch and scrape a list of URLs
//!
//! ## Failure Model
//!
//! Failures on a single page never abort a crawl. A page that times out or
//! errors is recorded with an empty body, and missing HTML elements are kept
//! as `None` and rendered with a placeholder such as `"Title not found"`.

mod cache;
mod config;
mod content_extraction;
mod error;
mod fetch;

pub use cache::{CacheError, DEFAULT_TTL, ResponseCache};
pub use config::{CrawlerConfig, CrawlerConfigBuilder, TextSource};
pub use content_extraction::{
    extract_links, extract_metadata, extract_text, normalize_url, parse_robots_directives,
};
pub use error::CrawlError;
pub use fetch::{FetchedPage, Fetcher};

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Placeholder shown when a page has no `<title>`
pub const TITLE_NOT_FOUND: &str = "Title not found";
/// Placeholder shown when a page has no meta description
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";
/// Placeholder shown when a page has no `<h1>`
pub const H1_NOT_FOUND: &str = "H1 not found";
/// Placeholder shown when a page has no canonical link
pub const CANONICAL_NOT_FOUND: &str = "Canonical not found";
/// Robots directives assumed when a page declares none
pub const DEFAULT_ROBOTS: &str = "index, follow";

/// A fetched and scraped page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    /// URL of the page, as listed in the sitemap
    pub url: String,

    /// HTTP status, `None` when the fetch failed
    pub status: Option<u16>,

    /// SEO metadata scraped from the page
    pub metadata: PageMetadata,

    /// Visible text used for embeddings
    pub text: String,

    /// Same-host links found on the page
    pub links: Vec<String>,
}

impl CrawledPage {
    /// Whether the fetch produced no usable body
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// How a page's canonical link relates to the page itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    /// The canonical link points at the page itself
    SelfReferencing,
    /// The canonical link points at a different URL
    Elsewhere,
    /// The page has no canonical link
    Missing,
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReferencing => write!(f, "Self-referencing"),
            Self::Elsewhere => write!(f, "Canonicalized elsewhere"),
            Self::Missing => write!(f, "Missing"),
        }
    }
}

/// SEO metadata for a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// URL of the page
    pub url: String,

    /// Text of the `<title>` element
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    pub description: Option<String>,

    /// Text of the first `<h1>` element
    pub h1: Option<String>,

    /// Absolute URL of `<link rel="canonical">`
    pub canonical_url: Option<String>,

    /// Relationship between the canonical URL and the page URL
    pub canonical_status: CanonicalStatus,

    /// Raw robots directives from the meta tag and `X-Robots-Tag` header
    pub robots_directives: Option<String>,
}

impl PageMetadata {
    /// Metadata for a page that could not be fetched or parsed
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            h1: None,
            canonical_url: None,
            canonical_status: CanonicalStatus::Missing,
            robots_directives: None,
        }
    }

    pub fn title_or_placeholder(&self) -> &str {
        self.title.as_deref().unwrap_or(TITLE_NOT_FOUND)
    }

    pub fn description_or_placeholder(&self) -> &str {
        self.description.as_deref().unwrap_or(DESCRIPTION_NOT_FOUND)
    }

    pub fn h1_or_placeholder(&self) -> &str {
        self.h1.as_deref().unwrap_or(H1_NOT_FOUND)
    }

    pub fn canonical_or_placeholder(&self) -> &str {
        self.canonical_url.as_deref().unwrap_or(CANONICAL_NOT_FOUND)
    }

    pub fn robots_or_default(&self) -> &str {
        self.robots_directives.as_deref().unwrap_or(DEFAULT_ROBOTS)
    }

    /// Whether search engines are asked not to index the page
    pub fn noindex(&self) -> bool {
        self.robots_directives
            .as_deref()
            .map(|d| parse_robots_directives(d).0)
            .unwrap_or(false)
    }

    /// Whether search engines are asked not to follow the page's links
    pub fn nofollow(&self) -> bool {
        self.robots_directives
            .as_deref()
            .map(|d| parse_robots_directives(d).1)
            .unwrap_or(false)
    }

    /// Short "Noindex/Nofollow" label, e.g. `"Noindex, Follow"`
    pub fn robots_label(&self) -> String {
        let index = if self.noindex() { "Noindex" } else { "Index" };
        let follow = if self.nofollow() { "Nofollow" } else { "Follow" };
        format!("{}, {}", index, follow)
    }
}

/// Scrape a fetched page into a `CrawledPage`
///
/// Never fails: metadata extraction errors are logged and replaced by
/// empty metadata.
pub fn scrape_page(fetched: &FetchedPage, config: &CrawlerConfig) -> CrawledPage {
    if fetched.html.is_empty() {
        return CrawledPage {
            url: fetched.url.clone(),
            status: fetched.status,
            metadata: PageMetadata::empty(&fetched.url),
            text: String::new(),
            links: Vec::new(),
        };
    }

    let metadata = match extract_metadata(
        &fetched.url,
        &fetched.html,
        fetched.robots_header.as_deref(),
    ) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Error extracting metadata from {}: {}", fetched.url, e);
            PageMetadata::empty(&fetched.url)
        }
    };

    let text = extract_text(&fetched.html, config.text_source, &config.exclude_selectors);
    let links = extract_links(&fetched.url, &fetched.html);

    CrawledPage {
        url: fetched.url.clone(),
        status: fetched.status,
        metadata,
        text,
        links,
    }
}

/// Fetch and scrape every URL
///
/// Results come back in the order of `urls`, re-associated by URL after
/// the concurrent fetch.
#[instrument(skip(fetcher, urls, progress), fields(count = urls.len()))]
pub async fn crawl_pages(
    fetcher: &Fetcher,
    urls: &[String],
    progress: Option<mpsc::Sender<String>>,
) -> Vec<CrawledPage> {
    info!("Crawling {} pages", urls.len());
    let mut fetched = fetcher.fetch_all(urls, progress).await;

    let pages: Vec<CrawledPage> = urls
        .iter()
        .map(|url| match fetched.remove(url) {
            Some(page) => scrape_page(&page, fetcher.config()),
            None => scrape_page(&FetchedPage::empty(url), fetcher.config()),
        })
        .collect();

    let failed = pages.iter().filter(|p| p.is_empty()).count();
    debug!("Scraped {} pages ({} without content)", pages.len(), failed);
    pages
}
