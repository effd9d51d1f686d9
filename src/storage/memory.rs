use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::storage::error::StorageError;
use crate::storage::object_store::{ObjectEntry, ObjectStore, PRESIGN_EXPIRY};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// In-process implementation of the ObjectStore trait for lightweight
/// deployments and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    version: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_etag(&self, data: &Bytes) -> String {
        let version = self.version.fetch_add(1, Ordering::Relaxed);
        format!("\"{}-{}\"", data.len(), version)
    }

    /// Stored content type, if any. Test hook with no S3 counterpart.
    pub async fn content_type_of(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().await;
        objects.get(key).and_then(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), StorageError> {
        let etag = self.next_etag(&data);
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
                metadata,
                etag,
                last_modified: Utc::now(),
            },
        );
        debug!("Stored object in memory: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects.contains_key(key))
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        let source = objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound(from.to_string()))?;
        let copied = StoredObject {
            last_modified: Utc::now(),
            ..source
        };
        objects.insert(to.to_string(), copied);
        Ok(())
    }

    async fn presign(&self, key: &str) -> Result<String, StorageError> {
        let objects = self.objects.read().await;
        if !objects.contains_key(key) {
            return Err(StorageError::ObjectNotFound(key.to_string()));
        }
        // Synthetic URL with the same expiry shape as a real presigner.
        let expires = Utc::now().timestamp() + PRESIGN_EXPIRY.as_secs() as i64;
        Ok(format!("memory:///{key}?expires={expires}"))
    }

    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, Result<ObjectEntry, StorageError>> {
        let objects = Arc::clone(&self.objects);
        let prefix = prefix.map(str::to_string);

        async move {
            let objects = objects.read().await;
            let mut entries: Vec<ObjectEntry> = objects
                .iter()
                .filter(|(key, _)| {
                    prefix
                        .as_deref()
                        .map_or(true, |prefix| key.starts_with(prefix))
                })
                .map(|(key, object)| ObjectEntry {
                    key: key.clone(),
                    size: object.data.len() as i64,
                    etag: Some(object.etag.clone()),
                    last_modified: Some(object.last_modified),
                })
                .collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            futures::stream::iter(entries.into_iter().map(Ok))
        }
        .into_stream()
        .flatten()
        .boxed()
    }

    async fn metadata(&self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|object| object.metadata.clone())
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
    }
}
