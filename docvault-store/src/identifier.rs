//! Document identifiers.
//!
//! Minted identifiers are unsigned JWT-shaped tokens: a base64url header
//! carrying the key version as `kid`, and a base64url payload carrying a
//! random UUID as `jti`. They are labels for routing to the right key and
//! object, not credentials. Nothing in them is trusted; every fetch and
//! delete still goes through the ownership check.
//!
//! Custom identifiers are chosen by the caller and live in a namespace
//! partitioned by owner, so two owners can use the same name without
//! touching each other's documents.

use crate::error::{StoreError, StoreResult};
use crate::types::OwnerId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use docvault_crypto::KeyVersion;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MINTED_PREFIX: &str = "documents";
const CUSTOM_PREFIX: &str = "custom";
const MAX_CUSTOM_NAME_LEN: usize = 200;

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
    kid: String,
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    jti: String,
}

/// Identifies a stored document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// Randomly minted; carries the key version the document was written with.
    Minted { key_version: KeyVersion, token: Uuid },
    /// Caller-chosen name scoped to one owner.
    Custom { owner_digest: String, name: String },
}

impl DocumentId {
    /// Mints a fresh identifier for the given key version.
    pub fn mint(key_version: KeyVersion) -> Self {
        DocumentId::Minted {
            key_version,
            token: Uuid::new_v4(),
        }
    }

    /// Builds an owner-scoped custom identifier.
    pub fn custom(owner: &OwnerId, name: &str) -> StoreResult<Self> {
        validate_custom_name(name)?;
        Ok(DocumentId::Custom {
            owner_digest: owner.digest(),
            name: name.to_string(),
        })
    }

    /// Parses a minted token as handed out by [`DocumentId::encode`].
    ///
    /// A single trailing `.` (an empty signature segment) is accepted.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.strip_suffix('.').unwrap_or(raw);
        let mut parts = trimmed.split('.');
        let (Some(header), Some(payload), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed("expected two dot-separated segments"));
        };

        let header: TokenHeader = decode_segment(header, "header")?;
        let payload: TokenPayload = decode_segment(payload, "payload")?;

        if header.alg != "none" {
            return Err(malformed(format!("unexpected alg {:?}", header.alg)));
        }

        let key_version: KeyVersion = header
            .kid
            .parse()
            .map_err(|_| malformed(format!("kid {:?} is not a key version", header.kid)))?;
        if key_version == 0 {
            return Err(malformed("kid must be a positive key version"));
        }

        let token = Uuid::parse_str(&payload.jti)
            .map_err(|e| malformed(format!("jti is not a uuid: {e}")))?;

        Ok(DocumentId::Minted { key_version, token })
    }

    /// Key version embedded in a minted identifier.
    pub fn key_version(&self) -> Option<KeyVersion> {
        match self {
            DocumentId::Minted { key_version, .. } => Some(*key_version),
            DocumentId::Custom { .. } => None,
        }
    }

    /// External form handed back to callers.
    pub fn encode(&self) -> String {
        match self {
            DocumentId::Minted { key_version, token } => {
                let header = TokenHeader {
                    alg: "none".to_string(),
                    typ: "JWT".to_string(),
                    kid: key_version.to_string(),
                };
                let payload = TokenPayload {
                    jti: token.to_string(),
                };
                format!("{}.{}", encode_segment(&header), encode_segment(&payload))
            }
            DocumentId::Custom { name, .. } => name.clone(),
        }
    }

    /// Object key in the blob backend.
    pub fn storage_key(&self) -> String {
        match self {
            DocumentId::Minted { .. } => format!("{MINTED_PREFIX}/{}", self.encode()),
            DocumentId::Custom { owner_digest, name } => {
                format!("{CUSTOM_PREFIX}/{owner_digest}/{name}")
            }
        }
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

fn validate_custom_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > MAX_CUSTOM_NAME_LEN {
        return Err(malformed(format!(
            "custom id must be 1-{MAX_CUSTOM_NAME_LEN} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(malformed("custom id cannot be a path segment"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(malformed(format!("custom id contains {bad:?}")));
    }
    Ok(())
}

fn encode_segment<T: Serialize>(value: &T) -> String {
    // Serializing these plain string structs cannot fail.
    let json = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> StoreResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| malformed(format!("{what} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(format!("{what} is not valid: {e}")))
}

fn malformed(msg: impl Into<String>) -> StoreError {
    StoreError::MalformedIdentifier(msg.into())
}
