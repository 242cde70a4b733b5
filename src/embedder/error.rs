//! Error types for the embedder module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for embedding operations
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedding provider returned an error
    #[error("Embedding provider error: {0}")]
    Embedding(#[from] rig::embeddings::EmbeddingError),

    /// The provider's API key is not set
    #[error("{0} environment variable must be set")]
    MissingApiKey(String),

    /// The provider returned a different number of vectors than texts sent
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A URL appears twice in one embedding set
    #[error("Duplicate URL: {0}")]
    DuplicateUrl(String),

    /// A vector's length differs from the rest of the set
    #[error("Embedding for {url} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        url: String,
        expected: usize,
        actual: usize,
    },

    /// A vector has no components
    #[error("Empty embedding for {0}")]
    EmptyVector(String),

    /// A vector holds NaN or an infinite component
    #[error("Embedding for {0} contains a non-finite value")]
    NonFiniteValue(String),

    /// An embeddings file could not be understood
    #[error("Invalid embeddings file: {0}")]
    InvalidFile(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<EmbedError> for CrateError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Io(e) => CrateError::Io(e),
            EmbedError::Json(e) => CrateError::Json(e),
            _ => CrateError::Embedding(err.to_string()),
        }
    }
}
