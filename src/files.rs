use bytes::Bytes;
use futures::TryStreamExt;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::storage::{ObjectStore, StorageError};
use crate::tasks::BackgroundTasks;
use crate::vector::{VectorIndex, VectorStore};

/// Largest accepted upload.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for upload. Everything stored is text-bearing, so
/// every stored file is indexable.
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = ["text/plain", "text/markdown"];

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Invalid file: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One stored file with a presigned download URL.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub key: String,
    pub url: String,
}

/// Validated upload surface over the blob store and the indexing pipeline.
///
/// Uploads are durable once `put` returns; indexing runs detached and a
/// failure there leaves the blob in place un-searched. Deletes drop the blob
/// synchronously and dispatch the vector delete alongside; the pair is not
/// transactional, so a crash in between can orphan a vector entry.
pub struct FileService<S: ObjectStore + ?Sized, I: VectorIndex + ?Sized> {
    storage: Arc<S>,
    vectors: Arc<VectorStore<S, I>>,
    tasks: BackgroundTasks,
}

fn validate_upload(key: &str, data: &Bytes, content_type: &str) -> Result<(), FileError> {
    if key.trim().is_empty() {
        return Err(FileError::Validation("file key must not be empty".into()));
    }
    if data.is_empty() {
        return Err(FileError::Validation("file must not be empty".into()));
    }
    if data.len() > MAX_FILE_BYTES {
        return Err(FileError::Validation(format!(
            "file is {} bytes, limit is {}",
            data.len(),
            MAX_FILE_BYTES
        )));
    }
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(FileError::Validation(format!(
            "content type {content_type} is not accepted"
        )));
    }
    Ok(())
}

impl<S: ObjectStore + ?Sized, I: VectorIndex + ?Sized> FileService<S, I> {
    pub fn new(storage: Arc<S>, vectors: Arc<VectorStore<S, I>>, tasks: BackgroundTasks) -> Self {
        FileService {
            storage,
            vectors,
            tasks,
        }
    }

    /// Validate and store an upload, then trigger detached indexing. The
    /// upload is never rolled back on an indexing failure.
    pub async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), FileError> {
        validate_upload(key, &data, content_type)?;

        self.storage
            .put(key, data, Some(content_type), HashMap::new())
            .await?;

        let vectors = Arc::clone(&self.vectors);
        let key = key.to_string();
        let mut metadata = IndexMap::new();
        metadata.insert(
            "content_type".to_string(),
            Value::String(content_type.to_string()),
        );
        self.tasks.spawn(async move {
            if let Err(e) = vectors.index_object(&key, metadata).await {
                warn!("Indexing of uploaded file {} failed: {}", key, e);
            }
        });
        Ok(())
    }

    /// Delete the blob and dispatch the vector delete alongside.
    pub async fn delete(&self, key: &str) -> Result<(), FileError> {
        self.storage.delete(key).await?;

        let vectors = Arc::clone(&self.vectors);
        let key = key.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = vectors.delete(&key).await {
                warn!("Vector delete for file {} failed: {}", key, e);
            }
        });
        Ok(())
    }

    /// Every stored key paired with a presigned download URL.
    pub async fn list(&self) -> Result<Vec<FileEntry>, FileError> {
        let entries: Vec<_> = self.storage.list(None).try_collect().await?;
        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let url = self.storage.presign(&entry.key).await?;
            files.push(FileEntry {
                key: entry.key,
                url,
            });
        }
        Ok(files)
    }
}
