use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

use crate::capture::request::{CapturedRequest, MockResponse};
use crate::store::error::StoreError;
use crate::store::repo::WebhookRepo;
use crate::tasks::BackgroundTasks;

/// The request-facing entry point: captures an inbound request against a
/// webhook and answers with the webhook's configured simulated response.
///
/// The durable append is dispatched through [`BackgroundTasks`] and is not
/// awaited: sender-visible latency is the simulated delay plus the config
/// lookup, never a database round-trip. A failed append is logged and
/// swallowed; the capture endpoint's contract is "always answer quickly with
/// the configured response", not "guarantee durability before responding".
pub struct CaptureEngine<R: WebhookRepo + ?Sized> {
    repo: Arc<R>,
    tasks: BackgroundTasks,
}

impl<R: WebhookRepo + ?Sized> CaptureEngine<R> {
    pub fn new(repo: Arc<R>, tasks: BackgroundTasks) -> Self {
        CaptureEngine { repo, tasks }
    }

    /// Handle one inbound request: look up the webhook's config, dispatch
    /// detached persistence, wait out the configured delay, and emit the
    /// configured response. Unknown webhooks get an immediate 404 and nothing
    /// is persisted.
    pub async fn capture(&self, webhook_id: Uuid, request: CapturedRequest) -> MockResponse {
        let config = match self.repo.config(webhook_id).await {
            Ok(config) => config,
            Err(StoreError::WebhookNotFound(_)) => {
                debug!("Capture against unknown webhook {}", webhook_id);
                return MockResponse::not_found();
            }
            Err(e) => {
                error!("Config lookup failed for webhook {}: {}", webhook_id, e);
                return MockResponse::internal_error();
            }
        };

        let draft = request.into_draft();
        let repo = Arc::clone(&self.repo);
        self.tasks.spawn(async move {
            match repo.append(webhook_id, draft).await {
                Ok(record) => {
                    debug!("Persisted request {} for webhook {}", record.id, webhook_id);
                }
                Err(e) => {
                    // Best-effort write path: the sender already has (or is
                    // about to get) its response. No retry queue exists, so
                    // this one record is dropped.
                    error!(
                        "Dropping captured request for webhook {}: {}",
                        webhook_id, e
                    );
                }
            }
        });

        if config.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.response_delay_ms as u64)).await;
        }

        MockResponse::from_config(&config)
    }
}
