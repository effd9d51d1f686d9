use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::error::StoreError;

pub const DEFAULT_RESPONSE_STATUS: i32 = 200;
pub const DEFAULT_RESPONSE_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_RESPONSE_BODY: &str = r#"{"status":"ok"}"#;
pub const DEFAULT_RESPONSE_DELAY_MS: i32 = 0;

/// Hard bound on the simulated delay so capture handlers stay responsive.
pub const MAX_RESPONSE_DELAY_MS: i32 = 100;
pub const MAX_RESPONSE_BODY_BYTES: usize = 1024 * 1024;
pub const MAX_CONTENT_TYPE_BYTES: usize = 1024;

/// A provisioned inbound endpoint and its simulated response settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: Uuid,
    pub response_status: i32,
    pub response_content_type: String,
    pub response_body: String,
    pub response_delay_ms: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Initial settings for a new webhook; unset fields take the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWebhook {
    pub response_status: Option<i32>,
    pub response_content_type: Option<String>,
    pub response_body: Option<String>,
    pub response_delay_ms: Option<i32>,
}

/// Partial update of a webhook's response settings. Unset fields are preserved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPatch {
    pub response_status: Option<i32>,
    pub response_content_type: Option<String>,
    pub response_body: Option<String>,
    pub response_delay_ms: Option<i32>,
}

fn validate_fields(
    status: Option<i32>,
    content_type: Option<&str>,
    body: Option<&str>,
    delay_ms: Option<i32>,
) -> Result<(), StoreError> {
    if let Some(status) = status {
        if !(100..=599).contains(&status) {
            return Err(StoreError::Validation(format!(
                "response_status must be between 100 and 599, got {status}"
            )));
        }
    }
    if let Some(content_type) = content_type {
        if content_type.len() > MAX_CONTENT_TYPE_BYTES {
            return Err(StoreError::Validation(format!(
                "response_content_type exceeds {MAX_CONTENT_TYPE_BYTES} bytes"
            )));
        }
    }
    if let Some(body) = body {
        if body.len() > MAX_RESPONSE_BODY_BYTES {
            return Err(StoreError::Validation(format!(
                "response_body exceeds {MAX_RESPONSE_BODY_BYTES} bytes"
            )));
        }
    }
    if let Some(delay_ms) = delay_ms {
        if !(0..=MAX_RESPONSE_DELAY_MS).contains(&delay_ms) {
            return Err(StoreError::Validation(format!(
                "response_delay_ms must be between 0 and {MAX_RESPONSE_DELAY_MS}, got {delay_ms}"
            )));
        }
    }
    Ok(())
}

impl NewWebhook {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_fields(
            self.response_status,
            self.response_content_type.as_deref(),
            self.response_body.as_deref(),
            self.response_delay_ms,
        )
    }
}

impl WebhookPatch {
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_fields(
            self.response_status,
            self.response_content_type.as_deref(),
            self.response_body.as_deref(),
            self.response_delay_ms,
        )
    }

    /// True when no field is supplied; such a patch only refreshes `updated_at`.
    pub fn is_empty(&self) -> bool {
        self.response_status.is_none()
            && self.response_content_type.is_none()
            && self.response_body.is_none()
            && self.response_delay_ms.is_none()
    }
}

/// One captured inbound request, append-only.
///
/// `headers`, `query_params`, and `platform_metadata` keep insertion order and
/// persist as JSON text; on read they round-trip back into the same key/value
/// structure, an empty map when originally absent, never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub body: Option<String>,
    pub ip_address: Option<String>,
    pub platform_metadata: IndexMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft of a request record, built by the capture engine before persistence.
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub body: Option<String>,
    pub ip_address: Option<String>,
    pub platform_metadata: IndexMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_empty() {
        assert!(WebhookPatch::default().is_empty());
        assert!(!WebhookPatch {
            response_status: Some(201),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn validation_bounds() {
        let ok = WebhookPatch {
            response_status: Some(100),
            response_delay_ms: Some(100),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_status = WebhookPatch {
            response_status: Some(600),
            ..Default::default()
        };
        assert!(matches!(
            bad_status.validate(),
            Err(StoreError::Validation(_))
        ));

        let bad_delay = WebhookPatch {
            response_delay_ms: Some(101),
            ..Default::default()
        };
        assert!(matches!(
            bad_delay.validate(),
            Err(StoreError::Validation(_))
        ));

        let bad_body = WebhookPatch {
            response_body: Some("x".repeat(MAX_RESPONSE_BODY_BYTES + 1)),
            ..Default::default()
        };
        assert!(matches!(bad_body.validate(), Err(StoreError::Validation(_))));

        let bad_content_type = WebhookPatch {
            response_content_type: Some("y".repeat(MAX_CONTENT_TYPE_BYTES + 1)),
            ..Default::default()
        };
        assert!(matches!(
            bad_content_type.validate(),
            Err(StoreError::Validation(_))
        ));
    }
}
