//! Shared types for document storage.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// The identity a document is stored on behalf of.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an owner id. Surrounding whitespace is trimmed; an empty id
    /// is rejected.
    pub fn new(id: impl AsRef<str>) -> StoreResult<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(StoreError::OwnerUnresolved("owner id is empty".to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 of the owner id. This is what gets persisted, so
    /// owner identities never reach the object store in clear.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as submitted for storage.
#[derive(Clone, Debug)]
pub struct NewDocument {
    pub content: Vec<u8>,
    pub content_type: String,
    pub title: String,
    /// Requested lifetime. Only honoured when the store allows
    /// request-supplied expiry.
    pub ttl: Option<Duration>,
}

impl NewDocument {
    pub fn new(content: impl Into<Vec<u8>>, content_type: &str, title: &str) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.to_string(),
            title: title.to_string(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A decrypted document returned from a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub content: Vec<u8>,
    pub content_type: String,
    pub title: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The persisted form of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub owner_digest: String,
    pub content_type: String,
    pub title: String,
    pub key_version: u32,
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        self.owner_digest == owner.digest()
    }

    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
