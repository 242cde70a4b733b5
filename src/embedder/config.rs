//! Configuration for embedding generation

/// Configuration for the embedder
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Texts sent per embedding request; capped by the model's own limit
    pub batch_size: usize,

    /// Page text is cut to this many characters before embedding
    pub max_text_chars: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            max_text_chars: 8000,
        }
    }
}

/// Builder for EmbedConfig
#[derive(Debug, Default)]
pub struct EmbedConfigBuilder {
    config: EmbedConfig,
}

impl EmbedConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EmbedConfig::default(),
        }
    }

    /// Set the batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the maximum number of characters embedded per page
    pub fn max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.config.max_text_chars = max_text_chars;
        self
    }

    /// Build the configuration
    pub fn build(self) -> EmbedConfig {
        self.config
    }
}

impl EmbedConfig {
    /// Create a new builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_config() {
        let config = EmbedConfig::default();
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.max_text_chars, 8000);

        let config = EmbedConfig::builder()
            .batch_size(8)
            .max_text_chars(1000)
            .build();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.max_text_chars, 1000);
    }
}
