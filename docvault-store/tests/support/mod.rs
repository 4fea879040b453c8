//! Shared test helpers: fast key rings, in-memory stores, misbehaving
//! backends and scanners.

#![allow(dead_code)]

use async_trait::async_trait;
use docvault_crypto::{CryptoEngine, EncryptionKey, KdfParams, KeyRing, KeyVersion};
use docvault_store::{
    BlobBackend, DocumentStore, InMemoryBackend, NewDocument, OwnerId, ScanVerdict, StoreError,
    StoreOptions, StoreResult, StoredObject, VirusScanner,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Passphrase used for key version `v` throughout the tests.
pub fn secret_for(version: KeyVersion) -> String {
    format!("test-passphrase-{version}")
}

/// Key ring with `active` plus `decryption` versions, cheap KDF params.
pub fn keyring(active: KeyVersion, decryption: &[KeyVersion]) -> KeyRing {
    KeyRing::new(
        EncryptionKey::new(active, secret_for(active)),
        decryption
            .iter()
            .map(|v| EncryptionKey::new(*v, secret_for(*v)))
            .collect::<Vec<_>>(),
        &KdfParams::test(),
    )
    .unwrap()
}

pub fn engine(active: KeyVersion, decryption: &[KeyVersion]) -> CryptoEngine {
    CryptoEngine::new(Arc::new(keyring(active, decryption)))
}

/// Store over a fresh in-memory backend, returned alongside the backend.
pub fn memory_store(active: KeyVersion) -> (DocumentStore, InMemoryBackend) {
    let backend = InMemoryBackend::new();
    let store = DocumentStore::builder(engine(active, &[]), Arc::new(backend.clone())).build();
    (store, backend)
}

pub fn store_over(
    backend: &InMemoryBackend,
    active: KeyVersion,
    decryption: &[KeyVersion],
) -> DocumentStore {
    DocumentStore::builder(engine(active, decryption), Arc::new(backend.clone())).build()
}

pub fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).unwrap()
}

pub fn text(content: &str, title: &str) -> NewDocument {
    NewDocument::new(content, "text/plain", title)
}

pub fn short_timeouts() -> StoreOptions {
    StoreOptions {
        backend_timeout: Duration::from_millis(50),
        scan_timeout: Duration::from_millis(50),
        ..StoreOptions::default()
    }
}

/// Backend whose every call takes longer than any test timeout.
pub struct StalledBackend;

#[async_trait]
impl BlobBackend for StalledBackend {
    async fn put(&self, _key: &str, _object: StoredObject, _ttl: Option<Duration>) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<StoredObject>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(false)
    }

    async fn health_check(&self) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

/// Backend that fails every call.
pub struct FailingBackend;

#[async_trait]
impl BlobBackend for FailingBackend {
    async fn put(&self, _key: &str, _object: StoredObject, _ttl: Option<Duration>) -> StoreResult<()> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<StoredObject>> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Err(StoreError::Backend("connection reset".into()))
    }
}

/// Scanner returning a fixed verdict and counting calls.
pub struct FixedScanner {
    verdict: ScanVerdict,
    calls: AtomicUsize,
}

impl FixedScanner {
    pub fn new(verdict: ScanVerdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VirusScanner for FixedScanner {
    async fn scan(&self, _content: &[u8]) -> ScanVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

/// Scanner that never answers in time.
pub struct HangingScanner;

#[async_trait]
impl VirusScanner for HangingScanner {
    async fn scan(&self, _content: &[u8]) -> ScanVerdict {
        tokio::time::sleep(Duration::from_secs(5)).await;
        ScanVerdict::Clean
    }
}
