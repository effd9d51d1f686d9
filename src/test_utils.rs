use crate::store::models::NewRequest;
use indexmap::IndexMap;

/// Check if a test is enabled via environment variable
fn is_test_enabled(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Check if database tests are enabled via environment variable
pub fn is_db_enabled() -> bool {
    is_test_enabled("ENABLE_DB_TESTS")
}

/// Check if S3 tests are enabled via environment variable
pub fn is_s3_enabled() -> bool {
    is_test_enabled("ENABLE_S3_TESTS")
}

/// S3 settings for the env-gated real-backend tests. Only consulted when
/// `ENABLE_S3_TESTS` is set.
pub fn test_s3_config() -> crate::config::S3Config {
    crate::config::S3Config {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok(),
        region: std::env::var("TEST_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        bucket: std::env::var("TEST_S3_BUCKET").unwrap_or_else(|_| "hooktrap-test".to_string()),
        access_key_id: std::env::var("TEST_S3_ACCESS_KEY_ID").ok(),
        secret_access_key: std::env::var("TEST_S3_SECRET_ACCESS_KEY").ok(),
    }
}

/// Build a captured-request draft with a single header, the shape most
/// capture-path tests need.
pub fn request_with_header(url: &str, header: (&str, &str)) -> NewRequest {
    let mut headers = IndexMap::new();
    headers.insert(header.0.to_string(), header.1.to_string());
    NewRequest {
        method: "POST".to_string(),
        url: url.to_string(),
        headers,
        ..Default::default()
    }
}
