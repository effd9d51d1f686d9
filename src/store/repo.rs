use crate::store::error::StoreError;
use crate::store::models::{NewRequest, NewWebhook, RequestRecord, WebhookConfig, WebhookPatch};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Listing requests caps out at this many rows per call.
pub const MAX_LIST_LIMIT: u32 = 100;

/// Repository over webhook configurations and their captured requests.
///
/// Implementations must guarantee that deleting a webhook removes all of its
/// requests in a single atomic operation (never a partial cascade), and that
/// request ids returned by [`poll`](WebhookRepo::poll) never go backward for a
/// reader that polls repeatedly with its last seen id.
#[async_trait]
pub trait WebhookRepo: Send + Sync + 'static {
    /// Create a webhook, assigning an id and applying defaults for unset fields.
    async fn create(&self, new: NewWebhook) -> Result<WebhookConfig, StoreError>;

    /// Fetch a webhook's configuration.
    async fn config(&self, webhook_id: Uuid) -> Result<WebhookConfig, StoreError>;

    /// Patch a webhook's response settings; unset fields are preserved.
    /// Validates ranges before applying and refreshes `updated_at`.
    async fn update(
        &self,
        webhook_id: Uuid,
        patch: WebhookPatch,
    ) -> Result<WebhookConfig, StoreError>;

    /// Delete a webhook and, atomically, every request captured against it.
    /// Deleting twice fails the second time with `WebhookNotFound`.
    async fn delete(&self, webhook_id: Uuid) -> Result<(), StoreError>;

    /// Append a captured request to a webhook's history.
    async fn append(
        &self,
        webhook_id: Uuid,
        new: NewRequest,
    ) -> Result<RequestRecord, StoreError>;

    /// List captured requests, newest first (id descending, `created_at`
    /// breaking ties). `filter` is a case-sensitive substring match over
    /// method, url, body, and id. `limit` is clamped to [`MAX_LIST_LIMIT`].
    async fn list(
        &self,
        webhook_id: Uuid,
        limit: u32,
        filter: Option<&str>,
    ) -> Result<Vec<RequestRecord>, StoreError>;

    /// Requests strictly newer than `last_id`, newest first. `Uuid::nil()` is
    /// the minimum cursor and returns the full history. A record appended
    /// concurrently with the call may be missed by it but must appear in the
    /// next poll with the same cursor.
    async fn poll(&self, webhook_id: Uuid, last_id: Uuid) -> Result<Vec<RequestRecord>, StoreError>;

    /// Fetch one request. The webhook id is part of the lookup key: a request
    /// owned by a different webhook is `RequestNotFound`, never leaked.
    async fn request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError>;

    /// Delete one request, returning the deleted record. Same ownership rule
    /// as [`request`](WebhookRepo::request).
    async fn delete_request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError>;
}

/// Implementation of WebhookRepo for Arc<T>, so a repository can be shared
/// across the capture engine and background persistence tasks.
#[async_trait]
impl<T: WebhookRepo + ?Sized> WebhookRepo for Arc<T> {
    async fn create(&self, new: NewWebhook) -> Result<WebhookConfig, StoreError> {
        (**self).create(new).await
    }

    async fn config(&self, webhook_id: Uuid) -> Result<WebhookConfig, StoreError> {
        (**self).config(webhook_id).await
    }

    async fn update(
        &self,
        webhook_id: Uuid,
        patch: WebhookPatch,
    ) -> Result<WebhookConfig, StoreError> {
        (**self).update(webhook_id, patch).await
    }

    async fn delete(&self, webhook_id: Uuid) -> Result<(), StoreError> {
        (**self).delete(webhook_id).await
    }

    async fn append(
        &self,
        webhook_id: Uuid,
        new: NewRequest,
    ) -> Result<RequestRecord, StoreError> {
        (**self).append(webhook_id, new).await
    }

    async fn list(
        &self,
        webhook_id: Uuid,
        limit: u32,
        filter: Option<&str>,
    ) -> Result<Vec<RequestRecord>, StoreError> {
        (**self).list(webhook_id, limit, filter).await
    }

    async fn poll(&self, webhook_id: Uuid, last_id: Uuid) -> Result<Vec<RequestRecord>, StoreError> {
        (**self).poll(webhook_id, last_id).await
    }

    async fn request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        (**self).request(webhook_id, request_id).await
    }

    async fn delete_request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        (**self).delete_request(webhook_id, request_id).await
    }
}
