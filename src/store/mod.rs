pub mod error;
pub mod fake;
pub mod models;
pub mod postgres;
pub mod repo;

pub use error::StoreError;
pub use fake::FakeRepo;
pub use models::{NewRequest, NewWebhook, RequestRecord, WebhookConfig, WebhookPatch};
pub use postgres::PostgresRepo;
pub use repo::WebhookRepo;
