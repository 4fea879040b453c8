//! Document store error types.

use docvault_crypto::CryptoError;
use std::time::Duration;
use thiserror::Error;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while storing, fetching, or deleting documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document's key version is retired or was never configured.
    #[error("no key available for key version {0}")]
    UnknownKeyVersion(u32),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("malformed document identifier: {0}")]
    MalformedIdentifier(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The requested lifetime cannot be represented as an expiry timestamp.
    #[error("invalid document expiry: {0}")]
    InvalidExpiry(String),

    #[error("virus detected in uploaded content")]
    VirusDetected,

    #[error("virus scan unavailable: {0}")]
    VirusScanUnavailable(String),

    /// Covers both "does not exist" and "exists but belongs to someone else".
    #[error("document not found")]
    NotFound,

    #[error("could not resolve document owner: {0}")]
    OwnerUnresolved(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Backend(_) | StoreError::Timeout { .. } | StoreError::VirusScanUnavailable(_)
        )
    }
}

impl From<CryptoError> for StoreError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::UnknownKeyVersion(version) => StoreError::UnknownKeyVersion(version),
            CryptoError::Decryption(msg) => StoreError::DecryptionFailed(msg),
            other => StoreError::Crypto(other.to_string()),
        }
    }
}
