use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the webhook/request repository
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Webhook not found: {0}")]
    WebhookNotFound(Uuid),

    #[error("Request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("Invalid webhook configuration: {0}")]
    Validation(String),

    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to deserialize database row: {0}")]
    Deserialization(String),

    #[error("Database operation failed: {0}")]
    Internal(String),
}
