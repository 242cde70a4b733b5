//! # Session
//!
//! A `Session` holds everything one run learned about a site: the crawled
//! pages with their metadata and links, plus the embedding of each page.
//! It is built once and then only read, so the interactive prompt can
//! answer any number of target queries against it.

use crate::crawler::{CrawledPage, normalize_url};
use crate::embedder::EmbeddingSet;
use crate::search::{RelatedPage, SearchError, SearchOptions, find_related_pages, mark_linked};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Pages and embeddings of one run
#[derive(Debug, Clone, Default)]
pub struct Session {
    pages: Vec<CrawledPage>,
    page_index: HashMap<String, usize>,
    embeddings: EmbeddingSet,
}

impl Session {
    /// Build a session from crawled pages and their embeddings
    ///
    /// Only the first page seen for a URL is kept.
    pub fn new(pages: Vec<CrawledPage>, embeddings: EmbeddingSet) -> Self {
        let mut kept = Vec::with_capacity(pages.len());
        let mut page_index = HashMap::with_capacity(pages.len());
        for page in pages {
            if page_index.contains_key(&page.url) {
                debug!("Dropping repeated page {}", page.url);
                continue;
            }
            page_index.insert(page.url.clone(), kept.len());
            kept.push(page);
        }

        Self {
            pages: kept,
            page_index,
            embeddings,
        }
    }

    /// A session with embeddings only, as loaded from an embeddings file
    pub fn from_embeddings(embeddings: EmbeddingSet) -> Self {
        Self::new(Vec::new(), embeddings)
    }

    pub fn pages(&self) -> &[CrawledPage] {
        &self.pages
    }

    pub fn embeddings(&self) -> &EmbeddingSet {
        &self.embeddings
    }

    pub fn page(&self, url: &str) -> Option<&CrawledPage> {
        self.page_index.get(url).map(|&i| &self.pages[i])
    }

    /// Whether `url` has an embedding in this session
    pub fn contains(&self, url: &str) -> bool {
        self.embeddings.contains(url)
    }

    /// Map user input onto a URL of this session
    ///
    /// Tries the input as given, then compares normalized forms so a
    /// missing trailing slash or a fragment still matches.
    pub fn resolve_target(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if self.contains(input) {
            return Some(input.to_string());
        }

        let wanted = normalize_url(input);
        self.embeddings
            .urls()
            .find(|url| normalize_url(url) == wanted)
            .map(str::to_string)
    }

    /// Link suggestions for a target page
    ///
    /// Results the target already links to are flagged as such.
    #[instrument(skip(self, options))]
    pub fn related(
        &self,
        target: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RelatedPage>, SearchError> {
        let resolved = self
            .resolve_target(target)
            .ok_or_else(|| SearchError::UrlNotFound(target.trim().to_string()))?;

        let mut results = find_related_pages(&resolved, &self.embeddings, options)?;

        if let Some(page) = self.page(&resolved) {
            let links: HashSet<String> = page.links.iter().map(|l| normalize_url(l)).collect();
            mark_linked(&mut results, &links);
        }

        Ok(results)
    }
}
