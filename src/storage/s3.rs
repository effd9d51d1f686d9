use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::{config::Region, Client};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::S3Config;
use crate::storage::error::StorageError;
use crate::storage::object_store::{ObjectEntry, ObjectStore, PRESIGN_EXPIRY};

const GET_CACHE_SIZE: usize = 100;

/// S3-compatible implementation of the ObjectStore trait. The endpoint
/// override covers R2/minio-style stores; path-style addressing is forced
/// whenever an override is set.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    cache: Arc<Mutex<lru::LruCache<String, Bytes>>>,
}

impl S3ObjectStore {
    /// Create a new S3ObjectStore instance from configuration
    pub async fn new(config: &S3Config) -> Result<Self, StorageError> {
        let config_loader = aws_config::from_env().region(Region::new(config.region.clone()));

        // If access key and secret are provided, use them for credentials
        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "StaticCredentialsProvider",
            );
            config_loader.credentials_provider(credentials).load().await
        } else {
            config_loader.load().await
        };

        let mut client_builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint {
            client_builder = client_builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(client_builder.build());

        let cache_size = NonZeroUsize::new(GET_CACHE_SIZE)
            .ok_or_else(|| StorageError::ConfigurationError("cache size must be non-zero".into()))?;
        let cache = Arc::new(Mutex::new(lru::LruCache::new(cache_size)));

        info!(
            "Connected to S3 bucket {} in region {}",
            config.bucket, config.region
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            cache,
        })
    }
}

fn object_to_entry(object: &aws_sdk_s3::types::Object) -> Option<ObjectEntry> {
    let key = object.key()?.to_string();
    let last_modified = object
        .last_modified()
        .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()));
    Some(ObjectEntry {
        key,
        size: object.size().unwrap_or(0),
        etag: object.e_tag().map(str::to_string),
        last_modified,
    })
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        // Check cache first
        {
            let mut cache = self.cache.lock().await;
            if let Some(data) = cache.get(key) {
                debug!("Cache hit for object: {}", key);
                return Ok(data.clone());
            }
        }

        debug!("Fetching object from S3: {}", key);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map(GetObjectError::is_no_such_key)
                    .unwrap_or(false)
                {
                    StorageError::ObjectNotFound(key.to_string())
                } else if e.to_string().contains("AccessDenied") {
                    StorageError::AccessDenied(key.to_string(), e.to_string())
                } else {
                    StorageError::ReadError(key.to_string(), e.to_string())
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ReadError(key.to_string(), e.to_string()))?
            .into_bytes();

        {
            let mut cache = self.cache.lock().await;
            cache.put(key.to_string(), data.clone());
        }

        Ok(data)
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(data.clone().into());
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        if !metadata.is_empty() {
            request = request.set_metadata(Some(metadata));
        }
        request
            .send()
            .await
            .map_err(|e| StorageError::WriteError(key.to_string(), e.to_string()))?;

        let mut cache = self.cache.lock().await;
        cache.put(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::WriteError(key.to_string(), e.to_string()))?;

        let mut cache = self.cache.lock().await;
        cache.pop(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .map(HeadObjectError::is_not_found)
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(e) => Err(StorageError::ReadError(key.to_string(), e.to_string())),
        }
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{}", self.bucket, from))
            .key(to)
            .send()
            .await
            .map_err(|e| StorageError::WriteError(to.to_string(), e.to_string()))?;

        // The destination may shadow a cached older value.
        let mut cache = self.cache.lock().await;
        cache.pop(to);
        Ok(())
    }

    async fn presign(&self, key: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(PRESIGN_EXPIRY)
            .map_err(|e| StorageError::ConfigurationError(e.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::ReadError(key.to_string(), e.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    fn list(&self, prefix: Option<&str>) -> BoxStream<'static, Result<ObjectEntry, StorageError>> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let prefix = prefix.map(str::to_string);

        // Outer None ends the stream; the inner Option is the continuation
        // token for the next page (None for the first page).
        let pages = futures::stream::try_unfold(
            Some(None::<String>),
            move |state: Option<Option<String>>| {
                let client = client.clone();
                let bucket = bucket.clone();
                let prefix = prefix.clone();
                async move {
                    let Some(token) = state else {
                        return Ok::<_, StorageError>(None);
                    };
                    let mut request = client.list_objects_v2().bucket(&bucket);
                    if let Some(prefix) = &prefix {
                        request = request.prefix(prefix);
                    }
                    if let Some(token) = &token {
                        request = request.continuation_token(token);
                    }
                    let response = request.send().await.map_err(|e| {
                        StorageError::ReadError("<list>".to_string(), e.to_string())
                    })?;

                    let entries: Vec<ObjectEntry> =
                        response.contents().iter().filter_map(object_to_entry).collect();
                    let next_state = response
                        .next_continuation_token()
                        .map(|t| Some(t.to_string()));
                    Ok(Some((entries, next_state)))
                }
            },
        );

        pages
            .map_ok(|page| futures::stream::iter(page.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn metadata(&self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map(HeadObjectError::is_not_found)
                    .unwrap_or(false)
                {
                    StorageError::ObjectNotFound(key.to_string())
                } else {
                    StorageError::ReadError(key.to_string(), e.to_string())
                }
            })?;
        Ok(response.metadata().cloned().unwrap_or_default())
    }
}
