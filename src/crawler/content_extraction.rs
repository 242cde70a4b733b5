//! Content extraction functionality for the crawler module

use crate::crawler::config::TextSource;
use crate::crawler::error::CrawlError;
use crate::crawler::{CanonicalStatus, PageMetadata};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::warn;
use url::Url;

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    if text.is_empty() { None } else { Some(text) }
}

/// Content of the first `<meta name=...>` whose name matches case-insensitively
fn meta_content(document: &Html, name: &str) -> Result<Option<String>, CrawlError> {
    let meta_selector = selector("meta[name]")?;
    Ok(document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|content| !content.is_empty()))
}

/// Normalize a URL for comparisons
///
/// Drops the fragment and any trailing slash on a non-root path. Strings
/// that do not parse as URLs are only trimmed.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let path = parsed.path().to_string();
            if path.len() > 1 && path.ends_with('/') {
                parsed.set_path(path.trim_end_matches('/'));
            }
            parsed.to_string()
        }
        Err(_) => url.trim().trim_end_matches('/').to_string(),
    }
}

/// Parse robots directives into `(noindex, nofollow)`
///
/// Accepts both meta tag content (`"noindex, nofollow"`) and
/// `X-Robots-Tag` values with a user agent prefix (`"googlebot: noindex"`).
pub fn parse_robots_directives(directives: &str) -> (bool, bool) {
    let mut noindex = false;
    let mut nofollow = false;

    for directive in directives.split(',') {
        let directive = directive.to_ascii_lowercase();
        let directive = directive.rsplit(':').next().unwrap_or("").trim();
        match directive {
            "noindex" => noindex = true,
            "nofollow" => nofollow = true,
            "none" => {
                noindex = true;
                nofollow = true;
            }
            _ => {}
        }
    }

    (noindex, nofollow)
}

/// Extract metadata from a page
///
/// # Arguments
///
/// * `url` - The URL of the page
/// * `html` - The HTML of the page
/// * `robots_header` - The `X-Robots-Tag` response header, if any
///
/// # Returns
///
/// The extracted metadata. Missing elements are `None`.
pub fn extract_metadata(
    url: &str,
    html: &str,
    robots_header: Option<&str>,
) -> Result<PageMetadata, CrawlError> {
    let document = Html::parse_document(html);
    let base = Url::parse(url)?;

    let title_selector = selector("title")?;
    let title = document.select(&title_selector).next().and_then(element_text);

    let description = meta_content(&document, "description")?;

    let h1_selector = selector("h1")?;
    let h1 = document.select(&h1_selector).next().and_then(element_text);

    let canonical_selector = selector("link[rel][href]")?;
    let canonical_url = document
        .select(&canonical_selector)
        .find(|element| {
            element.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| base.join(href).ok())
        .map(|canonical| canonical.to_string());

    let canonical_status = match &canonical_url {
        None => CanonicalStatus::Missing,
        Some(canonical) if normalize_url(canonical) == normalize_url(url) => {
            CanonicalStatus::SelfReferencing
        }
        Some(_) => CanonicalStatus::Elsewhere,
    };

    let meta_robots = meta_content(&document, "robots")?;
    let header_robots = robots_header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string);
    let robots_directives = match (meta_robots, header_robots) {
        (Some(meta), Some(header)) => Some(format!("{}, {}", meta, header)),
        (meta, header) => meta.or(header),
    };

    Ok(PageMetadata {
        url: url.to_string(),
        title,
        description,
        h1,
        canonical_url,
        canonical_status,
        robots_directives,
    })
}

/// Extract the text of a page used for embeddings
///
/// # Arguments
///
/// * `html` - The HTML of the page
/// * `source` - Which text to extract
/// * `exclude_selectors` - Elements dropped in `TextSource::Visible` mode
///
/// # Returns
///
/// The text with whitespace collapsed, empty if nothing was found
pub fn extract_text(html: &str, source: TextSource, exclude_selectors: &[String]) -> String {
    let document = Html::parse_document(html);

    match source {
        TextSource::Paragraphs => {
            let Ok(paragraph_selector) = selector("p") else {
                return String::new();
            };
            document
                .select(&paragraph_selector)
                .filter_map(element_text)
                .collect::<Vec<_>>()
                .join(" ")
        }
        TextSource::Visible => {
            let mut excluded = HashSet::new();
            for css in exclude_selectors {
                match Selector::parse(css) {
                    Ok(exclude) => excluded.extend(document.select(&exclude).map(|el| el.id())),
                    Err(e) => warn!("Failed to parse selector '{}': {}", css, e),
                }
            }

            let mut parts = Vec::new();
            for node in document.tree.root().descendants() {
                if let Node::Text(text) = node.value() {
                    if node.ancestors().any(|a| excluded.contains(&a.id())) {
                        continue;
                    }
                    let text = text.trim();
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }
            collapse_whitespace(&parts.join(" "))
        }
    }
}

/// Extract same-host links from a page
///
/// Links are resolved against the page URL, stripped of fragments and
/// deduplicated in document order. Links back to the page itself are
/// dropped.
pub fn extract_links(page_url: &str, html: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(anchor_selector) = selector("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let page = normalize_url(page_url);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(mut link) = base.join(href) else {
            continue;
        };
        if !matches!(link.scheme(), "http" | "https") || link.host_str() != base.host_str() {
            continue;
        }
        link.set_fragment(None);

        let link = link.to_string();
        if normalize_url(&link) == page {
            continue;
        }
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}
