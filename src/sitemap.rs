//! # Sitemap Module
//!
//! Retrieves a sitemap and turns it into the list of page URLs the rest of
//! the pipeline works on. Sitemap index documents are followed down to a
//! configurable depth, URLs are deduplicated in first-seen order and
//! unwanted file types (PDFs by default) are skipped.
//!
//! ## Key Components
//!
//! - `SitemapConfig`: Index depth, skipped extensions and URL limit
//! - `SitemapEntry`: One `<url>` of a urlset
//! - `parse_sitemap`: XML parser for urlsets and sitemap indexes
//! - `extract_sitemap_urls`: Fetch, follow and flatten a sitemap

mod config;
mod error;
mod parser;

pub use config::{SitemapConfig, SitemapConfigBuilder};
pub use error::SitemapError;
pub use parser::{SitemapDocument, parse_sitemap};

use crate::crawler::Fetcher;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A page listed in a sitemap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// Page URL from `<loc>`
    pub loc: String,

    /// Last modification date from `<lastmod>`, as written in the sitemap
    pub lastmod: Option<String>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
        }
    }
}

/// Whether a URL ends with one of the skipped extensions
fn has_skipped_extension(url: &str, extensions: &[String]) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase());
    extensions
        .iter()
        .any(|ext| path.ends_with(&ext.to_ascii_lowercase()))
}

/// Flatten parsed urlset entries into `out`, skipping duplicates
///
/// Returns `false` once `max_urls` is reached.
fn collect_entries(
    entries: Vec<SitemapEntry>,
    config: &SitemapConfig,
    seen: &mut HashSet<String>,
    out: &mut Vec<SitemapEntry>,
) -> bool {
    for entry in entries {
        if config.max_urls.is_some_and(|max| out.len() >= max) {
            return false;
        }
        if has_skipped_extension(&entry.loc, &config.skip_extensions) {
            debug!("Skipping {}", entry.loc);
            continue;
        }
        if seen.insert(entry.loc.clone()) {
            out.push(entry);
        }
    }
    !config.max_urls.is_some_and(|max| out.len() >= max)
}

/// Fetch a sitemap and return the page entries it lists
///
/// # Arguments
///
/// * `fetcher` - The HTTP fetcher
/// * `sitemap_url` - URL of a urlset or sitemap index
/// * `config` - Sitemap options
///
/// # Returns
///
/// Unique entries in the order they were first seen. Fails if the root
/// sitemap cannot be fetched or parsed; nested sitemaps that fail are
/// skipped with a warning.
#[instrument(skip(fetcher, config))]
pub async fn extract_sitemap_urls(
    fetcher: &Fetcher,
    sitemap_url: &str,
    config: &SitemapConfig,
) -> Result<Vec<SitemapEntry>, SitemapError> {
    Url::parse(sitemap_url)?;
    info!("Extracting URLs from sitemap {}", sitemap_url);

    let mut queue = VecDeque::from([(sitemap_url.to_string(), 0u32)]);
    let mut visited = HashSet::new();
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    while let Some((url, depth)) = queue.pop_front() {
        if !visited.insert(url.clone()) {
            continue;
        }
        let is_root = url == sitemap_url;

        let document = match fetcher.get_text(&url).await {
            Ok(xml) => parse_sitemap(&xml),
            Err(e) => Err(e.into()),
        };
        let document = match document {
            Ok(document) => document,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                warn!("Skipping nested sitemap {}: {}", url, e);
                continue;
            }
        };

        match document {
            SitemapDocument::UrlSet(urls) => {
                debug!("{} lists {} URLs", url, urls.len());
                if !collect_entries(urls, config, &mut seen, &mut entries) {
                    break;
                }
            }
            SitemapDocument::Index(children) => {
                if depth >= config.max_depth {
                    warn!("Not following sitemap index {}: depth limit reached", url);
                    continue;
                }
                debug!("{} references {} sitemaps", url, children.len());
                queue.extend(children.into_iter().map(|child| (child, depth + 1)));
            }
        }
    }

    info!("Found {} URLs", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn urlset(locs: &[String]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
        );
        for loc in locs {
            xml.push_str(&format!("<url><loc>{}</loc></url>", loc));
        }
        xml.push_str("</urlset>");
        xml
    }

    #[test]
    fn test_skipped_extension() {
        let pdf = vec![".pdf".to_string()];
        assert!(has_skipped_extension("https://example.com/guide.PDF", &pdf));
        assert!(!has_skipped_extension("https://example.com/guide?format=.pdf", &pdf));
        assert!(!has_skipped_extension("https://example.com/guide", &pdf));
    }

    #[tokio::test]
    async fn test_extract_urlset_dedups_and_skips() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let locs = vec![
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/a", base),
            format!("{}/brochure.pdf", base),
            format!("{}/c", base),
        ];
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(urlset(&locs))
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let entries = extract_sitemap_urls(
            &fetcher,
            &format!("{}/sitemap.xml", base),
            &SitemapConfig::default(),
        )
        .await
        .unwrap();

        let urls: Vec<_> = entries.iter().map(|e| e.loc.clone()).collect();
        assert_eq!(
            urls,
            vec![format!("{}/a", base), format!("{}/b", base), format!("{}/c", base)]
        );
        let unique: HashSet<_> = urls.iter().collect();
        assert_eq!(unique.len(), urls.len());
    }

    #[tokio::test]
    async fn test_extract_follows_index() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let index = format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{base}/posts.xml</loc></sitemap>
                <sitemap><loc>{base}/pages.xml</loc></sitemap>
                <sitemap><loc>{base}/broken.xml</loc></sitemap>
            </sitemapindex>"#
        );
        let _index = server
            .mock("GET", "/sitemap_index.xml")
            .with_body(index)
            .create_async()
            .await;
        let _posts = server
            .mock("GET", "/posts.xml")
            .with_body(urlset(&[format!("{}/post-1", base), format!("{}/shared", base)]))
            .create_async()
            .await;
        let _pages = server
            .mock("GET", "/pages.xml")
            .with_body(urlset(&[format!("{}/shared", base), format!("{}/about", base)]))
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/broken.xml")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let entries = extract_sitemap_urls(
            &fetcher,
            &format!("{}/sitemap_index.xml", base),
            &SitemapConfig::default(),
        )
        .await
        .unwrap();

        let urls: Vec<_> = entries.into_iter().map(|e| e.loc).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/post-1", base),
                format!("{}/shared", base),
                format!("{}/about", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_respects_depth_and_limit() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _index = server
            .mock("GET", "/index.xml")
            .with_body(format!(
                "<sitemapindex><sitemap><loc>{base}/urls.xml</loc></sitemap></sitemapindex>"
            ))
            .create_async()
            .await;
        let _urls = server
            .mock("GET", "/urls.xml")
            .with_body(urlset(&[
                format!("{}/1", base),
                format!("{}/2", base),
                format!("{}/3", base),
            ]))
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let index_url = format!("{}/index.xml", base);

        let shallow = SitemapConfig::builder().max_depth(0).build();
        let entries = extract_sitemap_urls(&fetcher, &index_url, &shallow).await.unwrap();
        assert!(entries.is_empty());

        let limited = SitemapConfig::builder().max_urls(Some(2)).build();
        let entries = extract_sitemap_urls(&fetcher, &index_url, &limited).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_root_failure_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_body("<html><body>Not a sitemap</body></html>")
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let result = extract_sitemap_urls(
            &fetcher,
            &format!("{}/sitemap.xml", server.url()),
            &SitemapConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(SitemapError::NotASitemap(_))));

        let result =
            extract_sitemap_urls(&fetcher, "not a url", &SitemapConfig::default()).await;
        assert!(matches!(result, Err(SitemapError::UrlParse(_))));
    }
}
