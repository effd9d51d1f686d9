use bytes::Bytes;
use futures::TryStreamExt;
use std::collections::HashMap;

use crate::storage::error::StorageError;
use crate::storage::memory::MemoryObjectStore;
use crate::storage::object_store::ObjectStore;
use crate::test_utils;

fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let store = MemoryObjectStore::new();
    store
        .put(
            "notes/a.txt",
            Bytes::from("hello"),
            Some("text/plain"),
            HashMap::new(),
        )
        .await
        .unwrap();

    let data = store.get("notes/a.txt").await.unwrap();
    assert_eq!(data, Bytes::from("hello"));
    assert_eq!(
        store.content_type_of("notes/a.txt").await.as_deref(),
        Some("text/plain")
    );
}

#[tokio::test]
async fn get_of_missing_key_is_not_found() {
    let store = MemoryObjectStore::new();
    let err = store.get("absent").await.unwrap_err();
    assert!(matches!(err, StorageError::ObjectNotFound(key) if key == "absent"));
}

#[tokio::test]
async fn put_replaces_the_previous_value() {
    let store = MemoryObjectStore::new();
    store
        .put("k", Bytes::from("one"), None, HashMap::new())
        .await
        .unwrap();
    store
        .put("k", Bytes::from("two"), None, HashMap::new())
        .await
        .unwrap();

    assert_eq!(store.get("k").await.unwrap(), Bytes::from("two"));
}

#[tokio::test]
async fn exists_reports_presence_and_confirmed_absence() {
    let store = MemoryObjectStore::new();
    assert!(!store.exists("k").await.unwrap());

    store
        .put("k", Bytes::from("x"), None, HashMap::new())
        .await
        .unwrap();
    assert!(store.exists("k").await.unwrap());

    store.delete("k").await.unwrap();
    assert!(!store.exists("k").await.unwrap());
}

#[tokio::test]
async fn delete_of_missing_key_succeeds() {
    let store = MemoryObjectStore::new();
    store.delete("never-stored").await.unwrap();
}

#[tokio::test]
async fn copy_duplicates_data_and_metadata() {
    let store = MemoryObjectStore::new();
    store
        .put(
            "src",
            Bytes::from("payload"),
            Some("text/markdown"),
            meta(&[("owner", "tests")]),
        )
        .await
        .unwrap();

    store.copy("src", "dst").await.unwrap();

    assert_eq!(store.get("dst").await.unwrap(), Bytes::from("payload"));
    assert_eq!(
        store.metadata("dst").await.unwrap().get("owner").map(String::as_str),
        Some("tests")
    );
    // Source is untouched.
    assert!(store.exists("src").await.unwrap());
}

#[tokio::test]
async fn copy_of_missing_source_is_not_found() {
    let store = MemoryObjectStore::new();
    let err = store.copy("absent", "dst").await.unwrap_err();
    assert!(matches!(err, StorageError::ObjectNotFound(_)));
    assert!(!store.exists("dst").await.unwrap());
}

#[tokio::test]
async fn presign_names_the_key_and_fails_for_missing_objects() {
    let store = MemoryObjectStore::new();
    store
        .put("files/report.md", Bytes::from("x"), None, HashMap::new())
        .await
        .unwrap();

    let url = store.presign("files/report.md").await.unwrap();
    assert!(url.contains("files/report.md"));
    assert!(url.contains("expires="));

    let err = store.presign("absent").await.unwrap_err();
    assert!(matches!(err, StorageError::ObjectNotFound(_)));
}

#[tokio::test]
async fn list_filters_by_prefix_and_orders_by_key() {
    let store = MemoryObjectStore::new();
    for key in ["b/2", "a/1", "b/1", "c"] {
        store
            .put(key, Bytes::from("x"), None, HashMap::new())
            .await
            .unwrap();
    }

    let all: Vec<_> = store.list(None).try_collect().await.unwrap();
    let keys: Vec<&str> = all.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["a/1", "b/1", "b/2", "c"]);

    let under_b: Vec<_> = store.list(Some("b/")).try_collect().await.unwrap();
    let keys: Vec<&str> = under_b.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["b/1", "b/2"]);
}

#[tokio::test]
async fn list_entries_carry_size_etag_and_timestamp() {
    let store = MemoryObjectStore::new();
    store
        .put("k", Bytes::from("12345"), None, HashMap::new())
        .await
        .unwrap();

    let entries: Vec<_> = store.list(None).try_collect().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].size, 5);
    assert!(entries[0].etag.is_some());
    assert!(entries[0].last_modified.is_some());
}

#[tokio::test]
async fn list_is_restartable() {
    let store = MemoryObjectStore::new();
    store
        .put("k", Bytes::from("x"), None, HashMap::new())
        .await
        .unwrap();

    let first: Vec<_> = store.list(None).try_collect().await.unwrap();
    let second: Vec<_> = store.list(None).try_collect().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn metadata_round_trips_and_defaults_to_empty() {
    let store = MemoryObjectStore::new();
    store
        .put(
            "with-meta",
            Bytes::from("x"),
            None,
            meta(&[("kind", "note"), ("lang", "en")]),
        )
        .await
        .unwrap();
    store
        .put("without-meta", Bytes::from("x"), None, HashMap::new())
        .await
        .unwrap();

    let metadata = store.metadata("with-meta").await.unwrap();
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata.get("kind").map(String::as_str), Some("note"));

    assert!(store.metadata("without-meta").await.unwrap().is_empty());
}

#[tokio::test]
async fn s3_round_trip_when_enabled() {
    if !test_utils::is_s3_enabled() {
        println!("Skipping S3 test - set ENABLE_S3_TESTS=true to enable");
        return;
    }

    let config = test_utils::test_s3_config();
    let store = crate::storage::s3::S3ObjectStore::new(&config)
        .await
        .unwrap();

    let key = format!("hooktrap-test/{}", uuid::Uuid::now_v7());
    store
        .put(
            &key,
            Bytes::from("round trip"),
            Some("text/plain"),
            meta(&[("origin", "test")]),
        )
        .await
        .unwrap();

    assert!(store.exists(&key).await.unwrap());
    assert_eq!(store.get(&key).await.unwrap(), Bytes::from("round trip"));
    assert_eq!(
        store.metadata(&key).await.unwrap().get("origin").map(String::as_str),
        Some("test")
    );

    let url = store.presign(&key).await.unwrap();
    assert!(url.contains(&config.bucket) || url.contains(&key));

    let listed: Vec<_> = store
        .list(Some("hooktrap-test/"))
        .try_collect()
        .await
        .unwrap();
    assert!(listed.iter().any(|e| e.key == key));

    store.delete(&key).await.unwrap();
    assert!(!store.exists(&key).await.unwrap());
}
