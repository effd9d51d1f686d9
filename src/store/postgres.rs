use crate::ids;
use crate::store::error::StoreError;
use crate::store::models::{
    NewRequest, NewWebhook, RequestRecord, WebhookConfig, WebhookPatch, DEFAULT_RESPONSE_BODY,
    DEFAULT_RESPONSE_CONTENT_TYPE, DEFAULT_RESPONSE_DELAY_MS, DEFAULT_RESPONSE_STATUS,
};
use crate::store::repo::{WebhookRepo, MAX_LIST_LIMIT};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Postgres error code for foreign key violations; an append hitting this
/// means the owning webhook is gone.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// A PostgreSQL implementation of the WebhookRepo trait
pub struct PostgresRepo {
    pool: PgPool,
}

impl PostgresRepo {
    /// Create a new PostgresRepo with the given connection URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy(database_url)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                StoreError::Connection(e.to_string())
            })?;

        if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
            error!("Database connectivity test failed: {}", e);
            return Err(StoreError::Connection(format!(
                "Database is not accessible: {}",
                e
            )));
        }

        let repo = PostgresRepo { pool };
        repo.initialize_schema().await?;

        info!("PostgreSQL webhook repository initialized successfully");
        Ok(repo)
    }

    /// Create the webhook and request tables plus their indexes
    async fn initialize_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS webhooks (
                id UUID PRIMARY KEY,
                response_status INTEGER NOT NULL,
                response_content_type TEXT NOT NULL,
                response_body TEXT NOT NULL,
                response_delay_ms INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS requests (
                id UUID PRIMARY KEY,
                webhook_id UUID NOT NULL REFERENCES webhooks(id) ON DELETE CASCADE,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                headers TEXT NOT NULL,
                query_params TEXT NOT NULL,
                body TEXT,
                ip_address TEXT,
                platform_metadata TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS webhooks_created_at_idx ON webhooks (created_at)",
            "CREATE INDEX IF NOT EXISTS webhooks_updated_at_idx ON webhooks (updated_at)",
            "CREATE INDEX IF NOT EXISTS requests_webhook_id_idx ON requests (webhook_id)",
            "CREATE INDEX IF NOT EXISTS requests_created_at_idx ON requests (created_at)",
            "CREATE INDEX IF NOT EXISTS requests_updated_at_idx ON requests (updated_at)",
            "CREATE INDEX IF NOT EXISTS requests_method_idx ON requests (method)",
            "CREATE INDEX IF NOT EXISTS requests_url_idx ON requests (url)",
            "CREATE INDEX IF NOT EXISTS requests_ip_address_idx ON requests (ip_address)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to initialize schema: {}", e);
                    StoreError::Internal(format!("Failed to initialize schema: {}", e))
                })?;
        }

        debug!("Webhook schema is in place");
        Ok(())
    }

    async fn webhook_exists(&self, webhook_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM webhooks WHERE id = $1")
            .bind(webhook_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to look up webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            })?;
        Ok(row.is_some())
    }
}

const WEBHOOK_COLUMNS: &str = "id, response_status, response_content_type, response_body, \
                               response_delay_ms, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, webhook_id, method, url, headers, query_params, body, \
                               ip_address, platform_metadata, created_at, updated_at";

fn webhook_from_row(row: &PgRow) -> Result<WebhookConfig, StoreError> {
    Ok(WebhookConfig {
        id: get_column(row, "id")?,
        response_status: get_column(row, "response_status")?,
        response_content_type: get_column(row, "response_content_type")?,
        response_body: get_column(row, "response_body")?,
        response_delay_ms: get_column(row, "response_delay_ms")?,
        created_at: get_column(row, "created_at")?,
        updated_at: get_column(row, "updated_at")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<RequestRecord, StoreError> {
    let headers: String = get_column(row, "headers")?;
    let query_params: String = get_column(row, "query_params")?;
    let platform_metadata: String = get_column(row, "platform_metadata")?;

    Ok(RequestRecord {
        id: get_column(row, "id")?,
        webhook_id: get_column(row, "webhook_id")?,
        method: get_column(row, "method")?,
        url: get_column(row, "url")?,
        headers: parse_map(&headers)?,
        query_params: parse_map(&query_params)?,
        body: get_column(row, "body")?,
        ip_address: get_column(row, "ip_address")?,
        platform_metadata: parse_map(&platform_metadata)?,
        created_at: get_column(row, "created_at")?,
        updated_at: get_column(row, "updated_at")?,
    })
}

fn get_column<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| {
        StoreError::Deserialization(format!("column {}: {}", column, e))
    })
}

/// Key/value columns persist as JSON text; an empty or blank column reads back
/// as an empty map, never null.
fn parse_map<V: serde::de::DeserializeOwned>(text: &str) -> Result<IndexMap<String, V>, StoreError> {
    if text.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    serde_json::from_str(text)
        .map_err(|e| StoreError::Deserialization(format!("invalid key/value JSON: {}", e)))
}

fn serialize_map<V: serde::Serialize>(map: &IndexMap<String, V>) -> Result<String, StoreError> {
    serde_json::to_string(map)
        .map_err(|e| StoreError::Internal(format!("failed to serialize key/value map: {}", e)))
}

/// Escape LIKE metacharacters so a filter matches only the literal substring,
/// the same semantics the in-memory repository has.
fn escape_like(filter: &str) -> String {
    filter
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl WebhookRepo for PostgresRepo {
    async fn create(&self, new: NewWebhook) -> Result<WebhookConfig, StoreError> {
        new.validate()?;

        let id = ids::new_webhook_id();
        let now = Utc::now();
        let webhook = WebhookConfig {
            id,
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

        sqlx::query(
            "INSERT INTO webhooks (id, response_status, response_content_type, response_body, \
             response_delay_ms, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(webhook.id)
        .bind(webhook.response_status)
        .bind(&webhook.response_content_type)
        .bind(&webhook.response_body)
        .bind(webhook.response_delay_ms)
        .bind(webhook.created_at)
        .bind(webhook.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert webhook {}: {}", id, e);
            StoreError::Internal(format!("Failed to create webhook: {}", e))
        })?;

        info!("Created webhook {}", id);
        Ok(webhook)
    }

    async fn config(&self, webhook_id: Uuid) -> Result<WebhookConfig, StoreError> {
        let query = format!("SELECT {} FROM webhooks WHERE id = $1", WEBHOOK_COLUMNS);
        let row = sqlx::query(&query)
            .bind(webhook_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            })?
            .ok_or(StoreError::WebhookNotFound(webhook_id))?;

        webhook_from_row(&row)
    }

    async fn update(
        &self,
        webhook_id: Uuid,
        patch: WebhookPatch,
    ) -> Result<WebhookConfig, StoreError> {
        patch.validate()?;

        // COALESCE keeps unset fields intact in a single statement;
        // updated_at is refreshed on every mutation, even an empty patch.
        let query = format!(
            "UPDATE webhooks SET \
             response_status = COALESCE($2, response_status), \
             response_content_type = COALESCE($3, response_content_type), \
             response_body = COALESCE($4, response_body), \
             response_delay_ms = COALESCE($5, response_delay_ms), \
             updated_at = $6 \
             WHERE id = $1 RETURNING {}",
            WEBHOOK_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(webhook_id)
            .bind(patch.response_status)
            .bind(patch.response_content_type)
            .bind(patch.response_body)
            .bind(patch.response_delay_ms)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            })?
            .ok_or(StoreError::WebhookNotFound(webhook_id))?;

        debug!("Updated webhook {}", webhook_id);
        webhook_from_row(&row)
    }

    async fn delete(&self, webhook_id: Uuid) -> Result<(), StoreError> {
        // ON DELETE CASCADE removes the webhook's requests in the same
        // statement; a partial cascade is impossible.
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(webhook_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::WebhookNotFound(webhook_id));
        }

        info!("Deleted webhook {} and its captured requests", webhook_id);
        Ok(())
    }

    async fn append(
        &self,
        webhook_id: Uuid,
        new: NewRequest,
    ) -> Result<RequestRecord, StoreError> {
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

        sqlx::query(
            "INSERT INTO requests (id, webhook_id, method, url, headers, query_params, body, \
             ip_address, platform_metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(record.id)
        .bind(record.webhook_id)
        .bind(&record.method)
        .bind(&record.url)
        .bind(serialize_map(&record.headers)?)
        .bind(serialize_map(&record.query_params)?)
        .bind(&record.body)
        .bind(&record.ip_address)
        .bind(serialize_map(&record.platform_metadata)?)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let fk_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);
            if fk_violation {
                StoreError::WebhookNotFound(webhook_id)
            } else {
                error!("Failed to append request to webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            }
        })?;

        debug!("Appended request {} to webhook {}", record.id, webhook_id);
        Ok(record)
    }

    async fn list(
        &self,
        webhook_id: Uuid,
        limit: u32,
        filter: Option<&str>,
    ) -> Result<Vec<RequestRecord>, StoreError> {
        if !self.webhook_exists(webhook_id).await? {
            return Err(StoreError::WebhookNotFound(webhook_id));
        }

        let limit = i64::from(limit.min(MAX_LIST_LIMIT));
        let rows = match filter {
            Some(filter) => {
                let query = format!(
                    "SELECT {} FROM requests WHERE webhook_id = $1 AND \
                     (method LIKE $2 OR url LIKE $2 OR body LIKE $2 OR id::text LIKE $2) \
                     ORDER BY id DESC, created_at DESC LIMIT $3",
                    REQUEST_COLUMNS
                );
                sqlx::query(&query)
                    .bind(webhook_id)
                    .bind(format!("%{}%", escape_like(filter)))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM requests WHERE webhook_id = $1 \
                     ORDER BY id DESC, created_at DESC LIMIT $2",
                    REQUEST_COLUMNS
                );
                sqlx::query(&query)
                    .bind(webhook_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            error!("Failed to list requests for webhook {}: {}", webhook_id, e);
            StoreError::Internal(e.to_string())
        })?;

        debug!("Listed {} requests for webhook {}", rows.len(), webhook_id);
        rows.iter().map(request_from_row).collect()
    }

    async fn poll(&self, webhook_id: Uuid, last_id: Uuid) -> Result<Vec<RequestRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM requests WHERE webhook_id = $1 AND id > $2 ORDER BY id DESC",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(webhook_id)
            .bind(last_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to poll requests for webhook {}: {}", webhook_id, e);
                StoreError::Internal(e.to_string())
            })?;

        rows.iter().map(request_from_row).collect()
    }

    async fn request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        let query = format!(
            "SELECT {} FROM requests WHERE id = $1 AND webhook_id = $2",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(request_id)
            .bind(webhook_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch request {}: {}", request_id, e);
                StoreError::Internal(e.to_string())
            })?
            .ok_or(StoreError::RequestNotFound(request_id))?;

        request_from_row(&row)
    }

    async fn delete_request(
        &self,
        webhook_id: Uuid,
        request_id: Uuid,
    ) -> Result<RequestRecord, StoreError> {
        let query = format!(
            "DELETE FROM requests WHERE id = $1 AND webhook_id = $2 RETURNING {}",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(request_id)
            .bind(webhook_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete request {}: {}", request_id, e);
                StoreError::Internal(e.to_string())
            })?
            .ok_or(StoreError::RequestNotFound(request_id))?;

        debug!("Deleted request {} from webhook {}", request_id, webhook_id);
        request_from_row(&row)
    }
}
