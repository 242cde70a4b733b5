//! # Similarity Search Module
//!
//! Ranks the pages of a run by how close their embeddings are to a target
//! page. This is the step that turns embeddings into internal-link
//! suggestions.
//!
//! ## Key Components
//!
//! - `SearchOptions`: How many suggestions to return and an optional score floor
//! - `RelatedPage`: One suggestion with its similarity score
//! - `find_related_pages`: Brute-force cosine ranking over an `EmbeddingSet`
//!
//! The target page is never part of its own result list. Pages with equal
//! scores keep the order in which they were embedded.

mod error;
mod similarity;

pub use error::SearchError;
pub use similarity::cosine_similarity;

use crate::crawler::normalize_url;
use crate::embedder::EmbeddingSet;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of suggestions returned when none is requested
pub const DEFAULT_TOP_N: usize = 3;

/// Search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,

    /// Drop results scoring below this value
    pub min_score: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_N,
            min_score: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.limit == 0 {
            return Err(SearchError::InvalidParameters(
                "limit must be at least 1".to_string(),
            ));
        }
        if let Some(min) = self.min_score {
            if !(-1.0..=1.0).contains(&min) {
                return Err(SearchError::InvalidParameters(format!(
                    "min_score must be between -1 and 1, got {}",
                    min
                )));
            }
        }
        Ok(())
    }
}

/// A page suggested as a link target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedPage {
    /// URL of the suggested page
    pub url: String,

    /// Cosine similarity to the target page
    pub score: f32,

    /// The target page already links here
    pub already_linked: bool,
}

/// Find the pages most similar to `target`
///
/// # Arguments
///
/// * `target` - URL of the page to find link suggestions for
/// * `embeddings` - All embeddings of the run
/// * `options` - Result limit and score floor
///
/// # Returns
///
/// Up to `options.limit` pages ordered by descending similarity, excluding
/// `target` itself, or `SearchError::UrlNotFound` when `target` has no
/// embedding.
#[instrument(skip(embeddings, options), fields(pages = embeddings.len(), limit = options.limit))]
pub fn find_related_pages(
    target: &str,
    embeddings: &EmbeddingSet,
    options: &SearchOptions,
) -> Result<Vec<RelatedPage>, SearchError> {
    options.validate()?;

    let target_vector = embeddings
        .get(target)
        .ok_or_else(|| SearchError::UrlNotFound(target.to_string()))?;

    let mut results: Vec<RelatedPage> = embeddings
        .iter()
        .filter(|entry| entry.url != target)
        .map(|entry| RelatedPage {
            url: entry.url.clone(),
            score: cosine_similarity(target_vector, &entry.vector),
            already_linked: false,
        })
        .filter(|page| options.min_score.is_none_or(|min| page.score >= min))
        .collect();

    // sort_by is stable, equal scores keep embedding order
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(options.limit);

    debug!("Found {} related pages for {}", results.len(), target);
    Ok(results)
}

/// Flag results the target page already links to
///
/// `links` holds normalized URLs; result URLs are normalized before lookup.
pub fn mark_linked(results: &mut [RelatedPage], links: &HashSet<String>) {
    for result in results {
        result.already_linked = links.contains(&normalize_url(&result.url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::PageEmbedding;

    fn set(entries: &[(&str, Vec<f32>)]) -> EmbeddingSet {
        EmbeddingSet::from_entries(
            entries
                .iter()
                .map(|(url, vector)| PageEmbedding {
                    url: url.to_string(),
                    vector: vector.clone(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_search_options_default() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, 3);
        assert!(options.min_score.is_none());
        assert_eq!(SearchOptions::with_limit(5).limit, 5);
    }

    #[test]
    fn test_target_excluded_from_results() {
        let embeddings = set(&[
            ("https://example.com/a", vec![1.0, 0.0]),
            ("https://example.com/b", vec![1.0, 0.0]),
            ("https://example.com/c", vec![0.9, 0.1]),
        ]);

        let results = find_related_pages(
            "https://example.com/a",
            &embeddings,
            &SearchOptions::with_limit(10),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.url != "https://example.com/a"));
        assert_eq!(results[0].url, "https://example.com/b");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ranking_and_limit() {
        let embeddings = set(&[
            ("https://example.com/target", vec![1.0, 0.0, 0.0]),
            ("https://example.com/far", vec![0.0, 0.0, 1.0]),
            ("https://example.com/near", vec![0.9, 0.1, 0.0]),
            ("https://example.com/mid", vec![0.5, 0.5, 0.0]),
            ("https://example.com/opposite", vec![-1.0, 0.0, 0.0]),
        ]);

        let results =
            find_related_pages("https://example.com/target", &embeddings, &SearchOptions::default())
                .unwrap();

        let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/near",
                "https://example.com/mid",
                "https://example.com/far"
            ]
        );
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let embeddings = set(&[
            ("https://example.com/t", vec![1.0, 0.0]),
            ("https://example.com/x", vec![0.0, 1.0]),
            ("https://example.com/y", vec![0.0, 2.0]),
            ("https://example.com/z", vec![0.0, 3.0]),
        ]);

        let results = find_related_pages(
            "https://example.com/t",
            &embeddings,
            &SearchOptions::with_limit(3),
        )
        .unwrap();
        let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/x", "https://example.com/y", "https://example.com/z"]
        );
    }

    #[test]
    fn test_min_score() {
        let embeddings = set(&[
            ("https://example.com/a", vec![1.0, 0.0]),
            ("https://example.com/b", vec![1.0, 0.1]),
            ("https://example.com/c", vec![0.0, 1.0]),
        ]);
        let options = SearchOptions {
            limit: 5,
            min_score: Some(0.5),
        };

        let results = find_related_pages("https://example.com/a", &embeddings, &options).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/b");
    }

    #[test]
    fn test_unknown_target() {
        let embeddings = set(&[("https://example.com/a", vec![1.0])]);

        let result = find_related_pages(
            "https://example.com/missing",
            &embeddings,
            &SearchOptions::default(),
        );
        assert!(matches!(result, Err(SearchError::UrlNotFound(url)) if url == "https://example.com/missing"));

        let result = find_related_pages(
            "https://example.com/a",
            &EmbeddingSet::new(),
            &SearchOptions::default(),
        );
        assert!(matches!(result, Err(SearchError::UrlNotFound(_))));
    }

    #[test]
    fn test_invalid_options() {
        let embeddings = set(&[("https://example.com/a", vec![1.0])]);
        let result = find_related_pages(
            "https://example.com/a",
            &embeddings,
            &SearchOptions::with_limit(0),
        );
        assert!(matches!(result, Err(SearchError::InvalidParameters(_))));
    }

    #[test]
    fn test_single_page_has_no_suggestions() {
        let embeddings = set(&[("https://example.com/a", vec![1.0])]);
        let results =
            find_related_pages("https://example.com/a", &embeddings, &SearchOptions::default())
                .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_mark_linked() {
        let mut results = vec![
            RelatedPage {
                url: "https://example.com/b".to_string(),
                score: 0.9,
                already_linked: false,
            },
            RelatedPage {
                url: "https://example.com/c/".to_string(),
                score: 0.8,
                already_linked: false,
            },
        ];
        let links: HashSet<String> = ["https://example.com/c".to_string()].into_iter().collect();

        mark_linked(&mut results, &links);
        assert!(!results[0].already_linked);
        assert!(results[1].already_linked);
    }
}
