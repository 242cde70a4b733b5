//! # Mock Embedding Model for Testing
//!
//! Provides a `MockEmbeddingModel` that implements the `EmbeddingModel` trait
//! without any network access. Each text is embedded as a hashed bag of
//! words, so texts sharing vocabulary end up close in cosine space and the
//! same text always gets the same vector.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A deterministic, offline embedding model.
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    ndims: usize,
    /// Number of `embed_texts` calls, shared between clones
    calls: Arc<AtomicUsize>,
    /// When set, every call fails with a provider error
    fail: Arc<AtomicBool>,
}

impl MockEmbeddingModel {
    /// Creates a model producing `ndims`-dimensional vectors.
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims: ndims.max(1),
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes subsequent calls fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of batches embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embeds a single text.
    pub fn vector(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vec[(hasher.finish() % self.ndims as u64) as usize] += 1.0;
        }
        vec
    }
}

impl Default for MockEmbeddingModel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 16;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let texts: Vec<String> = texts.into_iter().collect();
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::ProviderError(
                "mock model configured to fail".to_string(),
            ));
        }

        Ok(texts
            .into_iter()
            .map(|document| Embedding {
                vec: self.vector(&document),
                document,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_vectors_are_deterministic() {
        let model = MockEmbeddingModel::new(32);
        assert_eq!(model.vector("Garden tools!"), model.vector("garden TOOLS"));
        assert_eq!(model.vector("a b c").iter().sum::<f64>(), 3.0);
        assert!(model.vector("").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let model = MockEmbeddingModel::new(8);
        model.set_failing(true);

        let result = model.embed_texts(vec!["text".to_string()]).await;
        assert!(matches!(result, Err(EmbeddingError::ProviderError(_))));
        assert_eq!(model.calls(), 1);
    }
}
