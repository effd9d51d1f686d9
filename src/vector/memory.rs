use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;
use tracing::debug;

use crate::vector::embedding::{cosine_similarity, EmbeddingProvider};
use crate::vector::error::VectorError;
use crate::vector::index::{ScoredDocument, VectorDocument, VectorIndex};

struct Entry {
    document: VectorDocument,
    embedding: Vec<f32>,
}

/// In-process vector index ranking by cosine similarity over embeddings from
/// the wrapped provider. Keys are held in a BTreeMap so range restriction is
/// an ordered range scan. Unlike a hosted index, `list_keys` here is complete.
pub struct InMemoryVectorIndex<P: EmbeddingProvider> {
    provider: P,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl<P: EmbeddingProvider> InMemoryVectorIndex<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> VectorIndex for InMemoryVectorIndex<P> {
    async fn upsert(&self, document: VectorDocument) -> Result<(), VectorError> {
        let embedding = self.provider.embed(&document.content).await?;
        let mut entries = self.entries.write().await;
        debug!("Indexed document under key {}", document.key);
        entries.insert(
            document.key.clone(),
            Entry {
                document,
                embedding,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), VectorError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<VectorDocument>, VectorError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|entry| entry.document.clone()))
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        key_range: Option<(String, String)>,
    ) -> Result<Vec<ScoredDocument>, VectorError> {
        let query_embedding = self.provider.embed(query).await?;

        let entries = self.entries.read().await;
        let bounds = match &key_range {
            Some((start, end)) => (
                Bound::Included(start.clone()),
                Bound::Excluded(end.clone()),
            ),
            None => (Bound::Unbounded, Bound::Unbounded),
        };

        let mut hits: Vec<ScoredDocument> = entries
            .range(bounds)
            .map(|(_, entry)| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, VectorError> {
        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|key| prefix.map_or(true, |prefix| key.starts_with(prefix)))
            .cloned()
            .collect())
    }
}
