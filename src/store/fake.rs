use crate::ids;
use crate::store::error::StoreError;
use crate::store::models::{
    NewRequest, NewWebhook, RequestRecord, WebhookConfig, WebhookPatch, DEFAULT_RESPONSE_BODY,
    DEFAULT_RESPONSE_CONTENT_TYPE, DEFAULT_RESPONSE_DELAY_MS, DEFAULT_RESPONSE_STATUS,
};
use crate::store::repo::{WebhookRepo, MAX_LIST_LIMIT};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    webhooks: HashMap<Uuid, WebhookConfig>,
    /// Keyed by request id; BTreeMap iteration order is id order, which for
    /// v7 ids is creation order.
    requests: BTreeMap<Uuid, RequestRecord>,
}

/// A fake in-memory implementation of the WebhookRepo trait for testing.
/// Appends can be made to fail to exercise the best-effort capture path.
#[derive(Clone, Default)]
pub struct FakeRepo {
    inner: Arc<RwLock<Inner>>,
    fail_appends: Arc<AtomicBool>,
}

impl FakeRepo {
    /// Create a new empty FakeRepo
    pub fn new() -> Self {
        Self::default()
    }

    /// After calling this with `true`, every append fails with an internal error
    pub fn fake_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of stored requests across all webhooks
    pub fn fake_request_count(&self) -> usize {
        self.inner.read().unwrap().requests.len()
    }
}

fn matches_filter(record: &RequestRecord, filter: &str) -> bool {
    record.method.contains(filter)
        || record.url.contains(filter)
        || record.body.as_deref().is_some_and(|body| body.contains(filter))
        || record.id.to_string().contains(filter)
}

#[async_trait]
impl WebhookRepo for FakeRepo {
    async fn create(&self, new: NewWebhook) -> Result<WebhookConfig, StoreError> {
        new.validate()?;

        let now = Utc::now();
        let webhook = WebhookConfig {
            id: ids::new_webhook_id(),
            response_status: new.response_status.unwrap_or(DEFAULT_RESPONSE_STATUS),
            response_content_type: new
                .response_content_type
                .unwrap_or_else(|| DEFAULT_RESPONSE_CONTENT_TYPE.to_string()),
            response_body: new
                .response_body
                .unwrap_or_else(|| DEFAULT_RESPONSE_BODY.to_string()),
            response_delay_ms: new.response_delay_ms.unwrap_or(DEFAULT_RESPONSE_DELAY_MS),
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().unwrap();
        inner.webhooks.insert(webhook.id, webhook.clone());
        Ok(webhook)
    }

    async fn config(&self, webhook_id: Uuid) -> Result<WebhookConfig, StoreError> {
        let inner = self.inner.read().unwrap();
        inner
            .webhooks
            .get(&webhook_id)
            .cloned()
            .ok_or(StoreError::WebhookNotFound(webhook_id))
    }

    async fn update(
        &self,
        webhook_id: Uuid,
        patch: WebhookPatch,
    ) -> Result<WebhookConfig, StoreError> {
        patch.validate()?;

        let mut inner = self.inner.write().unwrap();
        let webhook = inner
            .webhooks
            .get_mut(&webhook_id)
            .ok_or(StoreError::WebhookNotFound(webhook_id))?;

        if let Some(status) = patch.response_status {
            webhook.response_status = status;
        }
        if let Some(content_type) = patch.response_content_type {
            webhook.response_content_type = content_type;
        }
        if let Some(body) = patch.response_body {
            webhook.response_body = body;
        }
        if let Some(delay_ms) = patch.response_delay_ms {
            webhook.response_delay_ms = delay_ms;
        }
        webhook.updated_at = Utc::now();

        Ok(webhook.clone())
    }

    async fn delete(&self, webhook_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        if inner.webhooks.remove(&webhook_id).is_none() {
            return Err(StoreError::WebhookNotFound(webhook_id));
        }
        inner
            .requests
            .retain(|_, record| record.webhook_id != webhook_id);
        Ok(())
    }

    async fn append(
        &self,
        webhook_id: Uuid,
        new: NewRequest,
    ) -> Result<RequestRecord, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("simulated append failure".to_string()));
        }

        let mut inner = self.inner.write().unwrap();
        if !inner.webhooks.contains_key(&webhook_id) {
            return Err(StoreError::WebhookNotFound(webhook_id));
        }

        let now = Utc::now();
        let record = RequestRecord {
            id: ids::new_request_id(),
            webhook_id,
            method: new.method,
            url: new.url,
            headers: new.headers,
            query_params: new.query_params,
            body: new.body,
            ip_address: new.ip_address,
            platform_metadata: new.platform_metadata,
            created_at: now,
            updated_at: now,
        };
        inner.requests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        webhook_id: Uuid,
        limit: u32,
        filter: Option<&str>,
    ) -> Result<Vec<RequestRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        if !inner.webhooks.contains_key(&webhook_id) {
            return Err(StoreError::WebhookNotFound(webhook_id));
        }

        let records = inner
            .requests
            .values()
            .rev()
            .filter(|record| record.webhook_id == webhook_id)
            .filter(|record| filter.map_or(true, |f| matches_filter(record, f)))
            .take(limit.min(MAX_LIST_LIMIT) as usize)
            .cloned()
            .collect();
        Ok(records)
    }

    async fn poll(&self, webhook_id: Uuid, last_id: Uuid) -> Result<Vec<RequestRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        let records = inner
            .requests
            .values()
            .rev()
            .filter(|record| record.webhook_id == webhook_id && record.id > last_id)
            .cloned()
            .collect();
        Ok(records)
    }

    async fn request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        let inner = self.inner.read().unwrap();
        inner
            .requests
            .get(&request_id)
            .filter(|record| record.webhook_id == webhook_id)
            .cloned()
            .ok_or(StoreError::RequestNotFound(request_id))
    }

    async fn delete_request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let Some(record) = inner.requests.remove(&request_id) else {
            return Err(StoreError::RequestNotFound(request_id));
        };
        if record.webhook_id != webhook_id {
            // Ownership mismatch: put the record back and report not-found.
            inner.requests.insert(record.id, record);
            return Err(StoreError::RequestNotFound(request_id));
        }
        Ok(record)
    }
}
