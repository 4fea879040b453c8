//! Document store orchestration.
//!
//! Write path: content-type and expiry checks, optional virus scan, encrypt,
//! mint an identifier, one backend put. Everything before the put is local, so a
//! rejected or cancelled store leaves nothing behind.
//!
//! Read and delete paths: load, check ownership and expiry, then decrypt or
//! remove. A record owned by someone else is reported exactly like a missing
//! one, even when its body is corrupt.

use crate::backend::{BlobBackend, StoredObject};
use crate::content_type::{ContentTypeValidator, SupportedContentTypes};
use crate::error::{StoreError, StoreResult};
use crate::identifier::DocumentId;
use crate::types::{Document, DocumentRecord, NewDocument, OwnerId};
use crate::virus_scan::{ScanVerdict, VirusScanner};
use chrono::{DateTime, Utc};
use docvault_crypto::CryptoEngine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Backend metadata entry recording the key version of a document.
pub const KEY_VERSION_METADATA: &str = "key-version";

/// Backend metadata entry recording the owner digest, readable without
/// parsing the record body.
pub const OWNER_DIGEST_METADATA: &str = "owner-digest";

/// Tunables for a [`DocumentStore`].
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Lifetime applied when the request does not (or may not) set one.
    pub default_ttl: Option<Duration>,
    /// Whether [`NewDocument::ttl`] is honoured.
    pub allow_request_ttl: bool,
    pub backend_timeout: Duration,
    pub scan_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_ttl: None,
            allow_request_ttl: false,
            backend_timeout: Duration::from_secs(10),
            scan_timeout: Duration::from_secs(30),
        }
    }
}

/// Encrypted, owner-scoped document storage on top of a [`BlobBackend`].
pub struct DocumentStore {
    engine: CryptoEngine,
    backend: Arc<dyn BlobBackend>,
    validator: Arc<dyn ContentTypeValidator>,
    scanner: Option<Arc<dyn VirusScanner>>,
    options: StoreOptions,
}

pub struct DocumentStoreBuilder {
    engine: CryptoEngine,
    backend: Arc<dyn BlobBackend>,
    validator: Arc<dyn ContentTypeValidator>,
    scanner: Option<Arc<dyn VirusScanner>>,
    options: StoreOptions,
}

impl DocumentStoreBuilder {
    pub fn content_type_validator(mut self, validator: Arc<dyn ContentTypeValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Enables virus scanning. Without a scanner no scan is attempted.
    pub fn virus_scanner(mut self, scanner: Arc<dyn VirusScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> DocumentStore {
        DocumentStore {
            engine: self.engine,
            backend: self.backend,
            validator: self.validator,
            scanner: self.scanner,
            options: self.options,
        }
    }
}

impl DocumentStore {
    pub fn builder(engine: CryptoEngine, backend: Arc<dyn BlobBackend>) -> DocumentStoreBuilder {
        DocumentStoreBuilder {
            engine,
            backend,
            validator: Arc::new(SupportedContentTypes),
            scanner: None,
            options: StoreOptions::default(),
        }
    }

    pub fn engine(&self) -> &CryptoEngine {
        &self.engine
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Stores a document under a freshly minted identifier.
    pub async fn store(&self, doc: NewDocument, owner: &OwnerId) -> StoreResult<DocumentId> {
        let (object, ttl) = self.seal(doc, owner).await?;
        let id = DocumentId::mint(self.engine.keyring().active_version());
        self.persist(&id, object, ttl).await?;
        Ok(id)
    }

    /// Stores a document under a caller-chosen name in the owner's
    /// namespace, replacing whatever was there.
    pub async fn store_custom(
        &self,
        name: &str,
        doc: NewDocument,
        owner: &OwnerId,
    ) -> StoreResult<DocumentId> {
        let id = DocumentId::custom(owner, name)?;
        let (object, ttl) = self.seal(doc, owner).await?;
        self.persist(&id, object, ttl).await?;
        Ok(id)
    }

    /// Fetches and decrypts a document the caller owns.
    pub async fn fetch(&self, id: &DocumentId, owner: &OwnerId) -> StoreResult<Document> {
        let record = self.load_owned(id, owner).await?;
        let content = self
            .engine
            .decrypt(record.key_version, &record.ciphertext, owner.as_str())?;

        Ok(Document {
            content,
            content_type: record.content_type,
            title: record.title,
            expires_at: record.expires_at,
        })
    }

    /// Parses a minted token, then fetches. Malformed tokens never reach
    /// the backend.
    pub async fn fetch_by_token(&self, token: &str, owner: &OwnerId) -> StoreResult<Document> {
        let id = DocumentId::parse(token)?;
        self.fetch(&id, owner).await
    }

    pub async fn fetch_custom(&self, name: &str, owner: &OwnerId) -> StoreResult<Document> {
        let id = DocumentId::custom(owner, name)?;
        self.fetch(&id, owner).await
    }

    /// Deletes a document the caller owns.
    pub async fn delete(&self, id: &DocumentId, owner: &OwnerId) -> StoreResult<()> {
        self.load_owned(id, owner).await?;

        let key = id.storage_key();
        let removed = with_timeout(
            "backend delete",
            self.options.backend_timeout,
            self.backend.delete(&key),
        )
        .await?;

        if !removed {
            // Expired or deleted concurrently between the load and the delete.
            return Err(StoreError::NotFound);
        }
        debug!("deleted document {key}");
        Ok(())
    }

    pub async fn delete_by_token(&self, token: &str, owner: &OwnerId) -> StoreResult<()> {
        let id = DocumentId::parse(token)?;
        self.delete(&id, owner).await
    }

    pub async fn delete_custom(&self, name: &str, owner: &OwnerId) -> StoreResult<()> {
        let id = DocumentId::custom(owner, name)?;
        self.delete(&id, owner).await
    }

    /// Checks that the backend is reachable.
    pub async fn health(&self) -> StoreResult<()> {
        with_timeout(
            "backend health check",
            self.options.backend_timeout,
            self.backend.health_check(),
        )
        .await
    }

    /// Validates, scans, and encrypts. No backend calls.
    async fn seal(
        &self,
        doc: NewDocument,
        owner: &OwnerId,
    ) -> StoreResult<(StoredObject, Option<Duration>)> {
        if !self.validator.validate(&doc.content_type, &doc.content) {
            debug!("rejected upload declared as {}", doc.content_type);
            return Err(StoreError::UnsupportedContentType(doc.content_type));
        }

        let ttl = self.effective_ttl(doc.ttl);
        let now = Utc::now();
        let expires_at = match ttl {
            Some(ttl) => Some(expiry_after(now, ttl)?),
            None => None,
        };

        self.scan(&doc.content).await?;

        let sealed = self.engine.encrypt(&doc.content, owner.as_str())?;

        let record = DocumentRecord {
            owner_digest: owner.digest(),
            content_type: doc.content_type,
            title: doc.title,
            key_version: sealed.key_version,
            ciphertext: sealed.ciphertext,
            created_at: now,
            expires_at,
        };

        let object = StoredObject::new(record.to_bytes()?)
            .with_metadata(KEY_VERSION_METADATA, record.key_version.to_string())
            .with_metadata(OWNER_DIGEST_METADATA, record.owner_digest.clone());
        Ok((object, ttl))
    }

    async fn persist(
        &self,
        id: &DocumentId,
        object: StoredObject,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let key = id.storage_key();
        let size = object.bytes.len();
        with_timeout(
            "backend put",
            self.options.backend_timeout,
            self.backend.put(&key, object, ttl),
        )
        .await?;
        debug!("stored document {key} ({size} bytes, ttl {ttl:?})");
        Ok(())
    }

    async fn scan(&self, content: &[u8]) -> StoreResult<()> {
        let Some(scanner) = &self.scanner else {
            return Ok(());
        };

        let after = self.options.scan_timeout;
        match tokio::time::timeout(after, scanner.scan(content)).await {
            Ok(ScanVerdict::Clean) => Ok(()),
            Ok(ScanVerdict::Infected) => Err(StoreError::VirusDetected),
            Ok(ScanVerdict::Unavailable(reason)) => Err(StoreError::VirusScanUnavailable(reason)),
            Err(_) => Err(StoreError::Timeout {
                operation: "virus scan",
                after,
            }),
        }
    }

    /// Loads a record and applies the expiry and ownership checks.
    async fn load_owned(&self, id: &DocumentId, owner: &OwnerId) -> StoreResult<DocumentRecord> {
        let key = id.storage_key();
        let object = with_timeout(
            "backend get",
            self.options.backend_timeout,
            self.backend.get(&key),
        )
        .await?
        .ok_or(StoreError::NotFound)?;

        let digest = owner.digest();
        let tagged_owner = object.metadata.get(OWNER_DIGEST_METADATA);
        if tagged_owner.is_some_and(|tagged| *tagged != digest) {
            debug!("document {key} requested by a different owner");
            return Err(StoreError::NotFound);
        }

        let record = match DocumentRecord::from_bytes(&object.bytes) {
            Ok(record) => record,
            // Only a caller proven to own the object learns that it is corrupt.
            Err(e) if tagged_owner.is_some() => {
                warn!("document {key} is corrupt: {e}");
                return Err(StoreError::DecryptionFailed(format!(
                    "stored record is corrupt: {e}"
                )));
            }
            Err(e) => {
                warn!("document {key} is corrupt and carries no owner tag: {e}");
                return Err(StoreError::NotFound);
            }
        };

        if record.is_expired(Utc::now()) {
            debug!("document {key} has expired");
            return Err(StoreError::NotFound);
        }
        if !record.is_owned_by(owner) {
            debug!("document {key} requested by a different owner");
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    fn effective_ttl(&self, requested: Option<Duration>) -> Option<Duration> {
        match requested {
            Some(ttl) if self.options.allow_request_ttl => Some(ttl),
            _ => self.options.default_ttl,
        }
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> StoreResult<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| StoreError::InvalidExpiry(format!("ttl {ttl:?} is out of range")))
}

async fn with_timeout<T>(
    operation: &'static str,
    after: Duration,
    fut: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| StoreError::Timeout { operation, after })?
}
