//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from key management and encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key version was never configured or has been retired.
    #[error("no key available for key version {0}")]
    UnknownKeyVersion(u32),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Wrong key material, wrong owner, or tampered/truncated ciphertext.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key ring: {0}")]
    InvalidKeyRing(String),
}
