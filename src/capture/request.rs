use indexmap::IndexMap;
use serde_json::Value;

use crate::store::models::{NewRequest, WebhookConfig};

/// Proxy headers consulted, in order, for the best-effort client address.
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// A transport-neutral view of one inbound request, handed to the capture
/// engine by the routing layer.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub body: Option<String>,
    /// Socket peer address as seen by the transport, if known.
    pub remote_addr: Option<String>,
    /// Free-form origin network/transport metadata supplied by the platform.
    pub platform_metadata: IndexMap<String, Value>,
}

impl CapturedRequest {
    /// Best-effort client IP: proxy headers first, socket peer last.
    /// `x-forwarded-for` may carry a chain; the first hop is the client.
    pub fn client_ip(&self) -> Option<String> {
        for name in IP_HEADERS {
            let value = self
                .headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value);
            if let Some(value) = value {
                let first_hop = value.split(',').next().unwrap_or(value).trim();
                if !first_hop.is_empty() {
                    return Some(first_hop.to_string());
                }
            }
        }
        self.remote_addr.clone()
    }

    /// Turn the inbound request into a persistence draft.
    pub fn into_draft(self) -> NewRequest {
        let ip_address = self.client_ip();
        NewRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            query_params: self.query_params,
            body: self.body,
            ip_address,
            platform_metadata: self.platform_metadata,
        }
    }
}

/// The simulated response the capture engine emits to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    /// Extra response headers; always carries the permissive CORS header.
    pub headers: IndexMap<String, String>,
}

fn cors_headers() -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    headers
}

impl MockResponse {
    pub fn from_config(config: &WebhookConfig) -> Self {
        MockResponse {
            status: config.response_status as u16,
            content_type: config.response_content_type.clone(),
            body: config.response_body.clone(),
            headers: cors_headers(),
        }
    }

    /// Terminal response for a capture against an unknown webhook.
    pub fn not_found() -> Self {
        MockResponse {
            status: 404,
            content_type: "application/json".to_string(),
            body: r#"{"error":"Webhook not found"}"#.to_string(),
            headers: cors_headers(),
        }
    }

    /// Generic response for an infrastructure fault during config lookup.
    /// Deliberately carries no backend detail.
    pub fn internal_error() -> Self {
        MockResponse {
            status: 500,
            content_type: "application/json".to_string(),
            body: r#"{"error":"Internal error"}"#.to_string(),
            headers: cors_headers(),
        }
    }
}
