use rig::embeddings::Embedding;

/// Helper functions for reading provider `Embedding`s as `Vec<f32>`
pub trait EmbeddingConversion {
    fn to_vec(&self) -> Vec<f32>;
    /// Whether every component is finite and at least one is non-zero
    fn is_usable(&self) -> bool;
}

impl EmbeddingConversion for Embedding {
    fn to_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|f| *f as f32).collect()
    }

    fn is_usable(&self) -> bool {
        !self.vec.is_empty()
            && self.vec.iter().all(|f| f.is_finite())
            && self.vec.iter().any(|f| *f != 0.0)
    }
}
