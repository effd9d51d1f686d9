use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::storage::error::StorageError;

/// How long a presigned download URL stays valid.
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// One object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: i64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage trait defining the interface for blob backends. Object existence is
/// the source of truth; entries are not linked to any relational row.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Get an object's bytes by key. `ObjectNotFound` if the key is absent.
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Store an object under a key, replacing any previous value.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), StorageError>;

    /// Delete an object. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// `Ok(false)` only when the backend confirms the object is absent; any
    /// other backend failure propagates as an error.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Copy an object to a new key within the same bucket.
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Presigned download URL, valid for [`PRESIGN_EXPIRY`].
    async fn presign(&self, key: &str) -> Result<String, StorageError>;

    /// Stream every object under the prefix (all objects when `None`), paging
    /// through backend continuation tokens transparently. The stream is cold:
    /// calling again restarts the listing from the beginning.
    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, Result<ObjectEntry, StorageError>>;

    /// User metadata stored with the object. `ObjectNotFound` if absent.
    async fn metadata(&self, key: &str) -> Result<HashMap<String, String>, StorageError>;
}

/// Implementation of ObjectStore for Arc<T> so shared instances can be handed
/// to detached tasks without an extra wrapper type.
#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        (**self).get(key).await
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), StorageError> {
        (**self).put(key, data, content_type, metadata).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        (**self).copy(from, to).await
    }

    async fn presign(&self, key: &str) -> Result<String, StorageError> {
        (**self).presign(key).await
    }

    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, Result<ObjectEntry, StorageError>> {
        (**self).list(prefix)
    }

    async fn metadata(&self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        (**self).metadata(key).await
    }
}
