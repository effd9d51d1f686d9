use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::storage::ObjectStore;
use crate::vector::error::VectorError;
use crate::vector::index::{ScoredDocument, VectorDocument, VectorIndex};

/// Search returns at most this many hits.
pub const SEARCH_LIMIT: usize = 10;

/// The indexing pipeline and search surface over a blob backend and a vector
/// index: blobs go in as UTF-8 text, one document per blob key.
pub struct VectorStore<S: ObjectStore + ?Sized, I: VectorIndex + ?Sized> {
    storage: Arc<S>,
    index: Arc<I>,
}

impl<S: ObjectStore + ?Sized, I: VectorIndex + ?Sized> VectorStore<S, I> {
    pub fn new(storage: Arc<S>, index: Arc<I>) -> Self {
        VectorStore { storage, index }
    }

    /// Fetch the blob under `key`, decode it as strict UTF-8, and upsert one
    /// document keyed by the blob key. The stored metadata is the caller's
    /// plus `key` and `indexed_at`; re-indexing replaces, never duplicates.
    pub async fn index_object(
        &self,
        key: &str,
        metadata: IndexMap<String, Value>,
    ) -> Result<(), VectorError> {
        debug!("Indexing blob {}", key);
        let data = self.storage.get(key).await?;
        let content = String::from_utf8(data.to_vec())
            .map_err(|e| VectorError::InvalidDocument(key.to_string(), e.to_string()))?;

        let mut merged = metadata;
        merged.insert("key".to_string(), Value::String(key.to_string()));
        merged.insert(
            "indexed_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        self.index
            .upsert(VectorDocument {
                key: key.to_string(),
                content,
                metadata: merged,
            })
            .await?;
        debug!("Indexed blob {}", key);
        Ok(())
    }

    /// Drop the document indexed under `key`, if any.
    pub async fn delete(&self, key: &str) -> Result<(), VectorError> {
        self.index.delete(key).await
    }

    /// Whether a document is indexed under `key`.
    pub async fn has(&self, key: &str) -> Result<bool, VectorError> {
        Ok(self.index.get(key).await?.is_some())
    }

    /// Indexed keys under the prefix. Best effort, same caveat as
    /// [`VectorIndex::list_keys`].
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, VectorError> {
        self.index.list_keys(prefix).await
    }

    /// Similarity search, best first, at most [`SEARCH_LIMIT`] hits. A prefix
    /// becomes the half-open key range `[prefix, prefix + U+10FFFF)`: the
    /// index has no native "starts with" operator, so the range stands in for
    /// one.
    pub async fn search(
        &self,
        query: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<ScoredDocument>, VectorError> {
        debug!("Searching for {:?} under prefix {:?}", query, prefix);
        let key_range = prefix.map(|p| (p.to_string(), format!("{p}\u{10FFFF}")));
        self.index.search(query, SEARCH_LIMIT, key_range).await
    }
}
