//! Owner-bound AES-256-GCM-SIV encryption.
//!
//! The nonce is derived from the owner, so it repeats across every document
//! an owner stores under one key version. GCM-SIV derives its keystream from
//! the plaintext as well as the nonce, so a repeated nonce only reveals
//! whether two plaintexts are identical.

use crate::error::{CryptoError, CryptoResult};
use crate::keyring::{KeyRing, KeyVersion};
use aes_gcm_siv::aead::{Aead, KeyInit, Payload};
use aes_gcm_siv::{Aes256GcmSiv, Nonce};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// AES-GCM-SIV nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

const NONCE_DOMAIN: &[u8] = b"docvault/owner-nonce/v1";

/// Ciphertext together with the key version that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub key_version: KeyVersion,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Nonce derived from the owner identity.
///
/// The same owner always gets the same nonce, which is what makes
/// encryption deterministic per (owner, plaintext, key version).
pub fn owner_nonce(owner: &str) -> [u8; NONCE_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(NONCE_DOMAIN);
    hasher.update([0u8]);
    hasher.update(owner.as_bytes());
    let digest = hasher.finalize();

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&digest[..NONCE_SIZE]);
    nonce
}

/// Encrypts with the active key and decrypts with any key on the ring.
#[derive(Clone, Debug)]
pub struct CryptoEngine {
    keyring: Arc<KeyRing>,
}

impl CryptoEngine {
    pub fn new(keyring: Arc<KeyRing>) -> Self {
        Self { keyring }
    }

    pub fn keyring(&self) -> &KeyRing {
        &self.keyring
    }

    /// Encrypts `plaintext` for `owner` under the active key version.
    pub fn encrypt(&self, plaintext: &[u8], owner: &str) -> CryptoResult<EncryptedPayload> {
        let key_version = self.keyring.active_version();
        let cipher = Aes256GcmSiv::new_from_slice(self.keyring.active_key().as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;
        let nonce = owner_nonce(owner);

        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: owner.as_bytes(),
                },
            )
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(EncryptedPayload {
            key_version,
            ciphertext,
        })
    }

    /// Decrypts `ciphertext` written for `owner` under `key_version`.
    pub fn decrypt(
        &self,
        key_version: KeyVersion,
        ciphertext: &[u8],
        owner: &str,
    ) -> CryptoResult<Vec<u8>> {
        let key = self.keyring.resolve(key_version)?;

        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::Decryption(format!(
                "ciphertext too short ({} bytes)",
                ciphertext.len()
            )));
        }

        let cipher = Aes256GcmSiv::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;
        let nonce = owner_nonce(owner);

        cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: ciphertext,
                    aad: owner.as_bytes(),
                },
            )
            .map_err(|_| {
                CryptoError::Decryption("authentication failed".to_string())
            })
    }
}
