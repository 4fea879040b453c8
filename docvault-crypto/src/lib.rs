//! Encryption layer for docvault.
//!
//! Provides owner-bound document encryption using:
//! - Argon2id to turn operator passphrases into 256-bit keys
//! - AES-256-GCM-SIV for nonce-misuse-resistant authenticated encryption
//! - A versioned key ring so old documents stay readable after rotation
//!
//! # Architecture
//!
//! Operators configure one *encryption* key version plus any number of
//! *decryption-only* versions. Every passphrase is stretched once, when the
//! [`KeyRing`] is built, and the derived keys live in memory for the life of
//! the process.
//!
//! The [`CryptoEngine`] always encrypts with the active version. The owner
//! identity seeds the nonce and is bound in as associated data, so a
//! ciphertext only opens for the owner it was written for.
//!
//! Encryption is deterministic per (owner, plaintext, key version): equal
//! plaintexts for one owner produce equal ciphertexts, different ones do not
//! share a keystream.

mod cipher;
mod error;
mod key;
mod keyring;

pub use cipher::{owner_nonce, CryptoEngine, EncryptedPayload, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, version_salt, DerivedKey, KdfParams, KeySecret, KEY_SIZE, SALT_SIZE};
pub use keyring::{EncryptionKey, KeyRing, KeyVersion};
