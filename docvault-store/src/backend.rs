//! Blob backend abstraction.
//!
//! The document store only needs durable key/value bytes with optional
//! per-object expiry. [`S3Backend`](crate::s3_backend::S3Backend) is the
//! production implementation; [`InMemoryBackend`] serves tests and local
//! runs.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Opaque bytes plus string metadata as held by a backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl StoredObject {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Durable byte storage with optional per-object TTL.
///
/// Objects past their TTL must behave as absent.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Writes (or overwrites) an object.
    async fn put(&self, key: &str, object: StoredObject, ttl: Option<Duration>) -> StoreResult<()>;

    /// Reads an object, `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;

    /// Removes an object. Returns `false` if there was nothing to remove.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Verifies the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;
}

#[derive(Clone)]
struct Entry {
    object: StoredObject,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Thread-safe in-process backend.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    objects: Arc<RwLock<HashMap<String, Entry>>>,
    puts: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls that reached this backend.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of live objects.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.objects
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Raw access for tests that need to inspect or corrupt stored bytes.
    pub async fn raw(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).map(|e| e.object.clone())
    }

    /// Replaces stored bytes without going through `put`.
    pub async fn overwrite_raw(&self, key: &str, bytes: Vec<u8>) -> bool {
        match self.objects.write().await.get_mut(key) {
            Some(entry) => {
                entry.object.bytes = bytes;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl BlobBackend for InMemoryBackend {
    async fn put(&self, key: &str, object: StoredObject, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                chrono::Duration::from_std(ttl)
                    .ok()
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .ok_or_else(|| StoreError::Backend(format!("ttl {ttl:?} out of range")))?,
            ),
            None => None,
        };
        self.objects
            .write()
            .await
            .insert(key.to_string(), Entry { object, expires_at });
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let now = Utc::now();
        let mut objects = self.objects.write().await;
        match objects.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.object.clone())),
            Some(_) => {
                objects.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let now = Utc::now();
        Ok(self
            .objects
            .write()
            .await
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
