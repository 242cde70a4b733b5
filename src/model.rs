//! # Embedding Client Module
//!
//! This module provides the client used to turn page text into embedding
//! vectors, with built-in rate limiting to avoid exhausting provider quotas.
//!
//! ## Key Components
//!
//! - `Client`: Wraps a rate-limited `rig` embedding model
//! - `Provider`: Which hosted embedding model to use
//! - `RateLimitedEmbeddingModel`: Adds a `governor` rate limiter to any embedding model
//! - `MockEmbeddingModel`: Deterministic offline model used in tests
//!
//! API keys are read from `GEMINI_API_KEY` or `OPENAI_API_KEY`.

use std::fmt;
use std::str::FromStr;

use ratelimited_embedding::RateLimitedEmbeddingModel;
use rig::embeddings::EmbeddingModel;
use rig::providers::{gemini, openai};

use crate::embedder::EmbedError;

pub mod embedding;
pub mod mock_model;
pub mod ratelimited_embedding;

pub use embedding::EmbeddingConversion;
pub use mock_model::MockEmbeddingModel;

/// Requests per minute allowed against the Gemini embedding endpoint
const GEMINI_EMBEDDINGS_PER_MINUTE: u32 = 1000;

/// Requests per minute allowed against the OpenAI embedding endpoint
const OPENAI_EMBEDDINGS_PER_MINUTE: u32 = 3000;

/// Hosted embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl Provider {
    /// Environment variable holding the provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown embedding provider: {}", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

fn api_key(provider: Provider) -> Result<String, EmbedError> {
    std::env::var(provider.api_key_var())
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| EmbedError::MissingApiKey(provider.api_key_var().to_string()))
}

#[derive(Debug, Clone)]
pub struct Client<E>
where
    E: EmbeddingModel,
{
    embedding_model: E,
}

impl Client<RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>> {
    pub fn new_gemini_from_env() -> Result<Self, EmbedError> {
        let gemini_client = gemini::Client::new(&api_key(Provider::Gemini)?);
        Ok(Self::new_gemini(gemini_client))
    }

    pub fn new_gemini(gemini_client: gemini::Client) -> Self {
        Self::new(RateLimitedEmbeddingModel::per_minute(
            gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
            GEMINI_EMBEDDINGS_PER_MINUTE,
        ))
    }
}

impl Client<RateLimitedEmbeddingModel<openai::EmbeddingModel>> {
    pub fn new_openai_from_env() -> Result<Self, EmbedError> {
        let openai_client = openai::Client::new(&api_key(Provider::OpenAi)?);
        Ok(Self::new_openai(openai_client))
    }

    pub fn new_openai(openai_client: openai::Client) -> Self {
        Self::new(RateLimitedEmbeddingModel::per_minute(
            openai_client.embedding_model(openai::TEXT_EMBEDDING_3_SMALL),
            OPENAI_EMBEDDINGS_PER_MINUTE,
        ))
    }
}

impl<E> Client<E>
where
    E: EmbeddingModel,
{
    /// Wrap an already configured embedding model
    pub fn new(embedding_model: E) -> Self {
        Self { embedding_model }
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("gemini".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert!("cohere".parse::<Provider>().is_err());
        assert_eq!(Provider::default().to_string(), "gemini");
        assert_eq!(Provider::OpenAi.api_key_var(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_client_wraps_model() {
        let client = Client::new(MockEmbeddingModel::new(8));
        assert_eq!(client.embedding().ndims(), 8);
    }
}
