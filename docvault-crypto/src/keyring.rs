//! Versioned key ring.
//!
//! Built once at startup from configuration and read-only afterwards. The
//! active version is always present among the decryption versions, so
//! anything written today can be read back tomorrow.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, version_salt, DerivedKey, KdfParams, KeySecret};
use std::collections::BTreeMap;
use tracing::info;

/// Operator-assigned key version. Strictly positive.
pub type KeyVersion = u32;

/// A configured version/passphrase pair.
#[derive(Clone, Debug)]
pub struct EncryptionKey {
    pub version: KeyVersion,
    pub secret: KeySecret,
}

impl EncryptionKey {
    pub fn new(version: KeyVersion, secret: impl Into<KeySecret>) -> Self {
        Self {
            version,
            secret: secret.into(),
        }
    }
}

/// Immutable set of derived keys indexed by version.
pub struct KeyRing {
    active_version: KeyVersion,
    keys: BTreeMap<KeyVersion, DerivedKey>,
}

impl KeyRing {
    /// Builds a key ring from the active encryption key and any additional
    /// decryption-only keys.
    ///
    /// The active pair is always added to the decryption set. Listing the
    /// same version twice with different passphrases is a configuration
    /// error.
    pub fn new(
        active: EncryptionKey,
        decryption: impl IntoIterator<Item = EncryptionKey>,
        params: &KdfParams,
    ) -> CryptoResult<Self> {
        let mut secrets: BTreeMap<KeyVersion, KeySecret> = BTreeMap::new();

        for key in std::iter::once(active.clone()).chain(decryption) {
            check_key(&key)?;
            match secrets.get(&key.version) {
                Some(existing) if *existing != key.secret => {
                    return Err(CryptoError::InvalidKeyRing(format!(
                        "key version {} configured with conflicting secrets",
                        key.version
                    )));
                }
                Some(_) => {}
                None => {
                    secrets.insert(key.version, key.secret);
                }
            }
        }

        let mut keys = BTreeMap::new();
        for (version, secret) in &secrets {
            keys.insert(*version, derive_key(secret, &version_salt(*version), params)?);
        }

        let ring = Self {
            active_version: active.version,
            keys,
        };

        info!(
            "key ring ready: encrypting with key version {}, decrypting with versions {:?}",
            ring.active_version,
            ring.versions()
        );
        Ok(ring)
    }

    /// The version every new document is encrypted with.
    pub fn active_version(&self) -> KeyVersion {
        self.active_version
    }

    /// Looks up the key for a version.
    pub fn resolve(&self, version: KeyVersion) -> CryptoResult<&DerivedKey> {
        self.keys
            .get(&version)
            .ok_or(CryptoError::UnknownKeyVersion(version))
    }

    /// The key for [`active_version`](Self::active_version).
    pub fn active_key(&self) -> &DerivedKey {
        // Construction guarantees the active version is present.
        &self.keys[&self.active_version]
    }

    pub fn contains(&self, version: KeyVersion) -> bool {
        self.keys.contains_key(&version)
    }

    /// All decryptable versions, ascending.
    pub fn versions(&self) -> Vec<KeyVersion> {
        self.keys.keys().copied().collect()
    }
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("active_version", &self.active_version)
            .field("versions", &self.versions())
            .finish()
    }
}

fn check_key(key: &EncryptionKey) -> CryptoResult<()> {
    if key.version == 0 {
        return Err(CryptoError::InvalidKeyRing(
            "key versions must be positive".to_string(),
        ));
    }
    if key.secret.is_empty() {
        return Err(CryptoError::InvalidKeyRing(format!(
            "empty secret for key version {}",
            key.version
        )));
    }
    Ok(())
}
