//! Integration tests for S3Backend against a local MinIO.
//!
//! Requires a MinIO on localhost:9000 with a `docvault-test` bucket and
//! `docvault-test` / `docvault-test-secret` credentials. Run with
//! `cargo test -p docvault-store --test s3_integration -- --ignored`.

mod support;

use docvault_store::config::S3Config;
use docvault_store::s3_backend::EXPIRES_AT_METADATA;
use docvault_store::*;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn minio_config() -> S3Config {
    S3Config {
        bucket: "docvault-test".into(),
        region: "us-east-1".into(),
        endpoint_override: Some("http://localhost:9000".into()),
        access_key: Some("docvault-test".into()),
        secret_key: Some("docvault-test-secret".into()),
        expiration_in_days: None,
    }
}

async fn minio() -> S3Backend {
    S3Backend::from_config(&minio_config()).await.unwrap()
}

/// Per-test unique key to prevent collisions.
fn unique_key(name: &str) -> String {
    format!("test-runs/{}/{name}", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn put_get_roundtrip_with_metadata() {
    let backend = minio().await;
    let key = unique_key("roundtrip.json");

    let object = StoredObject::new(b"{\"hello\":1}".to_vec()).with_metadata("key-version", "3");
    backend.put(&key, object, None).await.unwrap();

    let fetched = backend.get(&key).await.unwrap().unwrap();
    assert_eq!(fetched.bytes, b"{\"hello\":1}".to_vec());
    assert_eq!(fetched.metadata.get("key-version").map(String::as_str), Some("3"));
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn missing_key_is_none() {
    let backend = minio().await;
    assert!(backend.get(&unique_key("missing")).await.unwrap().is_none());
    assert!(!backend.delete(&unique_key("missing")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn delete_removes_object() {
    let backend = minio().await;
    let key = unique_key("delete.json");

    backend.put(&key, StoredObject::new(b"x".to_vec()), None).await.unwrap();
    assert!(backend.delete(&key).await.unwrap());
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn ttl_is_recorded_and_enforced() {
    let backend = minio().await;
    let key = unique_key("ttl.json");

    backend
        .put(&key, StoredObject::new(b"x".to_vec()), Some(Duration::from_secs(1)))
        .await
        .unwrap();
    let fetched = backend.get(&key).await.unwrap().unwrap();
    assert!(fetched.metadata.contains_key(EXPIRES_AT_METADATA));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn health_check_reaches_bucket() {
    minio().await.health_check().await.unwrap();
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn health_check_fails_for_missing_bucket() {
    let config = S3Config {
        bucket: format!("missing-{}", Uuid::new_v4()),
        ..minio_config()
    };
    let backend = S3Backend::from_config(&config).await.unwrap();
    let err = backend.health_check().await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
}

#[tokio::test]
#[ignore = "requires MinIO"]
#[serial]
async fn document_store_end_to_end() {
    let store = DocumentStore::builder(support::engine(1, &[]), Arc::new(minio().await)).build();
    let alice = support::owner("123");

    let id = store.store(support::text("hello", "t"), &alice).await.unwrap();
    assert_eq!(store.fetch(&id, &alice).await.unwrap().content, b"hello".to_vec());
    assert!(matches!(
        store.fetch(&id, &support::owner("456")).await.unwrap_err(),
        StoreError::NotFound
    ));

    store.delete(&id, &alice).await.unwrap();
    assert!(matches!(
        store.fetch(&id, &alice).await.unwrap_err(),
        StoreError::NotFound
    ));
}

#[tokio::test]
async fn empty_bucket_is_rejected_before_any_client_is_built() {
    let config = S3Config {
        bucket: "  ".into(),
        ..minio_config()
    };
    let err = S3Backend::from_config(&config).await.err().unwrap();
    assert!(matches!(err, StoreError::Config(_)));
}
