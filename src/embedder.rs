//! # Embedder Module
//!
//! Turns crawled page text into embedding vectors and manages the resulting
//! per-run `EmbeddingSet`. Embedding sets can be saved and reloaded as CSV
//! or JSON so suggestions can be computed later without re-crawling.
//!
//! ## Key Components
//!
//! - `EmbedConfig`: Batch size and text truncation
//! - `PageEmbedding`: One URL and its vector
//! - `EmbeddingSet`: URL-keyed collection of vectors with a fixed dimension
//! - `embed_pages`: Batch-embed crawled pages
//! - `save_embeddings` / `load_embeddings`: CSV and JSON embedding files

mod config;
mod error;
mod files;

pub use config::{EmbedConfig, EmbedConfigBuilder};
pub use error::EmbedError;
pub use files::{EmbeddingFileFormat, load_embeddings, save_embeddings};

use crate::crawler::CrawledPage;
use crate::model::{Client, EmbeddingConversion};
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// An embedding vector for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEmbedding {
    /// URL of the page
    pub url: String,

    /// Embedding vector
    #[serde(rename = "embedding")]
    pub vector: Vec<f32>,
}

/// Embeddings for one run, keyed by URL
///
/// Every vector has the same dimension and every URL appears once.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSet {
    entries: Vec<PageEmbedding>,
    index: HashMap<String, usize>,
}

impl EmbeddingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from entries, rejecting duplicate URLs and mixed dimensions
    pub fn from_entries(entries: Vec<PageEmbedding>) -> Result<Self, EmbedError> {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry)?;
        }
        Ok(set)
    }

    /// Add an embedding
    pub fn insert(&mut self, entry: PageEmbedding) -> Result<(), EmbedError> {
        if entry.vector.is_empty() {
            return Err(EmbedError::EmptyVector(entry.url));
        }
        if entry.vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::NonFiniteValue(entry.url));
        }
        if let Some(expected) = self.dimensions() {
            if entry.vector.len() != expected {
                return Err(EmbedError::DimensionMismatch {
                    url: entry.url,
                    expected,
                    actual: entry.vector.len(),
                });
            }
        }
        if self.index.contains_key(&entry.url) {
            return Err(EmbedError::DuplicateUrl(entry.url));
        }

        self.index.insert(entry.url.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// The vector for a URL
    pub fn get(&self, url: &str) -> Option<&[f32]> {
        self.index
            .get(url)
            .map(|&i| self.entries[i].vector.as_slice())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension shared by all vectors, `None` while empty
    pub fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.vector.len())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PageEmbedding> {
        self.entries.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.url.as_str())
    }

    pub fn into_entries(self) -> Vec<PageEmbedding> {
        self.entries
    }
}

/// Truncate text to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Embed the text of crawled pages
///
/// # Arguments
///
/// * `client` - The embedding client
/// * `pages` - Crawled pages; pages without text are skipped
/// * `config` - Batch size and truncation
///
/// # Returns
///
/// An `EmbeddingSet` with one entry per page that had text. Provider
/// errors abort the run.
#[instrument(skip(client, pages, config), fields(pages = pages.len()))]
pub async fn embed_pages<E>(
    client: &Client<E>,
    pages: &[CrawledPage],
    config: &EmbedConfig,
) -> Result<EmbeddingSet, EmbedError>
where
    E: EmbeddingModel,
{
    let inputs: Vec<(&str, &str)> = pages
        .iter()
        .filter_map(|page| {
            if page.text.trim().is_empty() {
                warn!("No text found on {}, skipping", page.url);
                None
            } else {
                Some((page.url.as_str(), page.text.as_str()))
            }
        })
        .collect();

    embed_documents(client, &inputs, config).await
}

/// Embed `(url, text)` pairs in batches
pub async fn embed_documents<E>(
    client: &Client<E>,
    inputs: &[(&str, &str)],
    config: &EmbedConfig,
) -> Result<EmbeddingSet, EmbedError>
where
    E: EmbeddingModel,
{
    let batch_size = config.batch_size.clamp(1, E::MAX_DOCUMENTS.max(1));
    info!(
        "Generating embeddings for {} texts in batches of {}",
        inputs.len(),
        batch_size
    );

    let mut set = EmbeddingSet::new();
    for batch in inputs.chunks(batch_size) {
        let texts: Vec<String> = batch
            .iter()
            .map(|(_, text)| truncate_chars(text, config.max_text_chars).to_string())
            .collect();

        let embeddings = client.embedding().embed_texts(texts).await?;
        if embeddings.len() != batch.len() {
            return Err(EmbedError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        for ((url, _), embedding) in batch.iter().zip(embeddings) {
            if !embedding.is_usable() {
                warn!("Embedding for {} is empty or invalid, skipping", url);
                continue;
            }
            match set.insert(PageEmbedding {
                url: url.to_string(),
                vector: embedding.to_vec(),
            }) {
                Ok(()) => {}
                Err(EmbedError::DuplicateUrl(url)) => debug!("Ignoring repeated URL {}", url),
                Err(EmbedError::NonFiniteValue(url)) => {
                    warn!("Embedding for {} overflows f32, skipping", url)
                }
                Err(e) => return Err(e),
            }
        }
        debug!("Embedded batch of {}", batch.len());
    }

    Ok(set)
}
