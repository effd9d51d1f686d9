use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::{MemoryObjectStore, ObjectStore, StorageError};
use crate::vector::error::VectorError;
use crate::vector::index::{VectorDocument, VectorIndex};
use crate::vector::memory::InMemoryVectorIndex;
use crate::vector::mock::{FailingEmbeddingProvider, MappingEmbeddingProvider, MockEmbeddingProvider};
use crate::vector::store::VectorStore;

fn mapping_provider(pairs: &[(&str, [f32; 2])]) -> MappingEmbeddingProvider {
    let mappings: HashMap<String, Vec<f32>> = pairs
        .iter()
        .map(|(text, vector)| (text.to_string(), vector.to_vec()))
        .collect();
    MappingEmbeddingProvider::new(mappings, 2)
}

fn doc(key: &str, content: &str) -> VectorDocument {
    VectorDocument {
        key: key.to_string(),
        content: content.to_string(),
        metadata: IndexMap::new(),
    }
}

async fn store_with_blob(
    key: &str,
    data: &[u8],
) -> (
    VectorStore<MemoryObjectStore, InMemoryVectorIndex<MockEmbeddingProvider>>,
    Arc<InMemoryVectorIndex<MockEmbeddingProvider>>,
) {
    let storage = Arc::new(MemoryObjectStore::new());
    storage
        .put(key, Bytes::copy_from_slice(data), None, HashMap::new())
        .await
        .unwrap();
    let index = Arc::new(InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![
        1.0, 0.0,
    ])));
    (VectorStore::new(storage, Arc::clone(&index)), index)
}

#[tokio::test]
async fn upsert_replaces_the_document_under_a_key() {
    let index = InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![1.0, 0.0]));
    index.upsert(doc("k", "first")).await.unwrap();
    index.upsert(doc("k", "second")).await.unwrap();

    let stored = index.get("k").await.unwrap().unwrap();
    assert_eq!(stored.content, "second");
    assert_eq!(index.list_keys(None).await.unwrap(), vec!["k"]);
}

#[tokio::test]
async fn search_ranks_by_similarity_descending() {
    let provider = mapping_provider(&[
        ("apple pie", [1.0, 0.0]),
        ("apple tart", [0.9, 0.1]),
        ("bicycle", [0.0, 1.0]),
        ("apple", [1.0, 0.0]),
    ]);
    let index = InMemoryVectorIndex::new(provider);
    index.upsert(doc("a", "apple pie")).await.unwrap();
    index.upsert(doc("b", "apple tart")).await.unwrap();
    index.upsert(doc("c", "bicycle")).await.unwrap();

    let hits = index.search("apple", 10, None).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].document.key, "a");
    assert_eq!(hits[1].document.key, "b");
    assert_eq!(hits[2].document.key, "c");
    assert!(hits[0].score > hits[1].score);
    assert!(hits[1].score > hits[2].score);
}

#[tokio::test]
async fn search_honors_the_limit() {
    let index = InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![1.0, 0.0]));
    for i in 0..15 {
        index.upsert(doc(&format!("k{i}"), "text")).await.unwrap();
    }

    let hits = index.search("query", 10, None).await.unwrap();
    assert_eq!(hits.len(), 10);
}

#[tokio::test]
async fn search_key_range_is_half_open() {
    let index = InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![1.0, 0.0]));
    for key in ["notes/a", "notes/z", "other/a"] {
        index.upsert(doc(key, "text")).await.unwrap();
    }

    let hits = index
        .search(
            "query",
            10,
            Some(("notes/".to_string(), "other/".to_string())),
        )
        .await
        .unwrap();
    let keys: Vec<&str> = hits.iter().map(|h| h.document.key.as_str()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&"notes/a"));
    assert!(keys.contains(&"notes/z"));
}

#[tokio::test]
async fn delete_then_search_misses() {
    let index = InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![1.0, 0.0]));
    index.upsert(doc("k", "text")).await.unwrap();
    index.delete("k").await.unwrap();
    index.delete("k").await.unwrap(); // absent key still succeeds

    assert!(index.get("k").await.unwrap().is_none());
    assert!(index.search("query", 10, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn index_object_carries_metadata_key_and_timestamp() {
    let (store, index) = store_with_blob("notes/a.txt", b"some text").await;

    let mut metadata = IndexMap::new();
    metadata.insert("origin".to_string(), json!("upload"));
    store.index_object("notes/a.txt", metadata).await.unwrap();

    let stored = index.get("notes/a.txt").await.unwrap().unwrap();
    assert_eq!(stored.content, "some text");
    assert_eq!(stored.metadata.get("origin"), Some(&json!("upload")));
    assert_eq!(stored.metadata.get("key"), Some(&json!("notes/a.txt")));
    assert!(matches!(stored.metadata.get("indexed_at"), Some(Value::String(_))));
}

#[tokio::test]
async fn reindexing_never_duplicates() {
    let storage = Arc::new(MemoryObjectStore::new());
    storage
        .put("k", Bytes::from("v1"), None, HashMap::new())
        .await
        .unwrap();
    let provider = Arc::new(MockEmbeddingProvider::new(vec![1.0, 0.0]));
    let index = Arc::new(InMemoryVectorIndex::new(Arc::clone(&provider)));
    let store = VectorStore::new(storage, Arc::clone(&index));

    store.index_object("k", IndexMap::new()).await.unwrap();
    store.index_object("k", IndexMap::new()).await.unwrap();

    // One document survives, but both passes went through the model.
    assert_eq!(index.list_keys(None).await.unwrap().len(), 1);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn index_object_of_missing_blob_is_a_storage_error() {
    let storage = Arc::new(MemoryObjectStore::new());
    let index = Arc::new(InMemoryVectorIndex::new(MockEmbeddingProvider::new(vec![
        1.0, 0.0,
    ])));
    let store = VectorStore::new(storage, index);

    let err = store.index_object("absent", IndexMap::new()).await.unwrap_err();
    assert!(matches!(
        err,
        VectorError::Storage(StorageError::ObjectNotFound(_))
    ));
}

#[tokio::test]
async fn index_object_rejects_non_utf8_blobs() {
    let (store, index) = store_with_blob("binary", &[0xff, 0xfe, 0x00]).await;

    let err = store.index_object("binary", IndexMap::new()).await.unwrap_err();
    assert!(matches!(err, VectorError::InvalidDocument(key, _) if key == "binary"));
    assert!(!store.has("binary").await.unwrap());
    assert_eq!(index.list_keys(None).await.unwrap().len(), 0);
}

#[tokio::test]
async fn embedding_failure_surfaces_and_indexes_nothing() {
    let storage = Arc::new(MemoryObjectStore::new());
    storage
        .put("k", Bytes::from("text"), None, HashMap::new())
        .await
        .unwrap();
    let index = Arc::new(InMemoryVectorIndex::new(FailingEmbeddingProvider));
    let store = VectorStore::new(storage, Arc::clone(&index));

    let err = store.index_object("k", IndexMap::new()).await.unwrap_err();
    assert!(matches!(err, VectorError::Embedding(_)));
    assert!(index.list_keys(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn prefix_search_only_sees_matching_keys() {
    let provider = MockEmbeddingProvider::new(vec![1.0, 0.0]);
    let index = Arc::new(InMemoryVectorIndex::new(provider));
    let storage = Arc::new(MemoryObjectStore::new());
    for key in ["notes/a", "notes/b", "drafts/a"] {
        storage
            .put(key, Bytes::from("text"), None, HashMap::new())
            .await
            .unwrap();
    }
    let store = VectorStore::new(storage, index);
    for key in ["notes/a", "notes/b", "drafts/a"] {
        store.index_object(key, IndexMap::new()).await.unwrap();
    }

    let hits = store.search("query", Some("notes/")).await.unwrap();
    let keys: Vec<&str> = hits.iter().map(|h| h.document.key.as_str()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.starts_with("notes/")));

    // No prefix sees everything, capped at the search limit.
    assert_eq!(store.search("query", None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_reports_indexed_keys_under_a_prefix() {
    let (store, _index) = store_with_blob("notes/a", b"text").await;
    store.index_object("notes/a", IndexMap::new()).await.unwrap();

    assert_eq!(store.list(Some("notes/")).await.unwrap(), vec!["notes/a"]);
    assert!(store.list(Some("drafts/")).await.unwrap().is_empty());
    assert!(store.has("notes/a").await.unwrap());
}
