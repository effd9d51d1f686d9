use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

use crate::vector::error::VectorError;

/// One indexed document. The key is the blob key the content came from; a
/// re-index under the same key replaces the previous document.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub key: String,
    pub content: String,
    pub metadata: IndexMap<String, Value>,
}

/// A search hit with its similarity score, higher is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: VectorDocument,
    pub score: f32,
}

/// Trait for vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync + 'static {
    /// Insert or replace the document stored under its key.
    async fn upsert(&self, document: VectorDocument) -> Result<(), VectorError>;

    /// Remove the document under the key. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), VectorError>;

    /// Fetch the document under the key, if indexed.
    async fn get(&self, key: &str) -> Result<Option<VectorDocument>, VectorError>;

    /// Similarity search, best matches first, at most `limit` hits. When
    /// `key_range` is set only documents whose key falls in the half-open
    /// range `[start, end)` are considered.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        key_range: Option<(String, String)>,
    ) -> Result<Vec<ScoredDocument>, VectorError>;

    /// Indexed keys under the prefix (all keys when `None`). Best effort:
    /// backends may return partial results and callers must not assume
    /// completeness.
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, VectorError>;
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for Arc<T> {
    async fn upsert(&self, document: VectorDocument) -> Result<(), VectorError> {
        (**self).upsert(document).await
    }

    async fn delete(&self, key: &str) -> Result<(), VectorError> {
        (**self).delete(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<VectorDocument>, VectorError> {
        (**self).get(key).await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        key_range: Option<(String, String)>,
    ) -> Result<Vec<ScoredDocument>, VectorError> {
        (**self).search(query, limit, key_range).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, VectorError> {
        (**self).list_keys(prefix).await
    }
}
