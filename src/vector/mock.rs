use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::vector::embedding::EmbeddingProvider;
use crate::vector::error::EmbeddingError;

/// Embedding provider returning one fixed vector for every input. Counts
/// calls so tests can assert how often the model was consulted.
pub struct MockEmbeddingProvider {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.vector.clone())
    }
}

/// Embedding provider with a fixed text-to-vector table; unknown texts get a
/// zero vector of the configured dimension. Lets tests shape the similarity
/// ranking deterministically.
pub struct MappingEmbeddingProvider {
    mappings: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl MappingEmbeddingProvider {
    pub fn new(mappings: HashMap<String, Vec<f32>>, dimension: usize) -> Self {
        Self {
            mappings,
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MappingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .mappings
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }
}

/// Embedding provider that always fails, for exercising pipeline error paths.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ApiError("mock failure".to_owned()))
    }
}
