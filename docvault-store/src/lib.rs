//! Owner-scoped encrypted document storage.
//!
//! Provides:
//! - Per-owner encryption under a versioned key ring (see `docvault-crypto`)
//! - Minted and owner-partitioned custom document identifiers
//! - An S3-backed blob store with per-document expiry
//! - Content-type gating and optional HTTP virus scanning
//! - Resolution of the effective owner for end-user and system callers

pub mod backend;
pub mod config;
pub mod content_type;
pub mod error;
pub mod identifier;
pub mod owner;
pub mod s3_backend;
pub mod store;
pub mod types;
pub mod virus_scan;

pub use backend::{BlobBackend, InMemoryBackend, StoredObject};
pub use config::StoreConfig;
pub use content_type::{ContentTypeValidator, SupportedContentTypes};
pub use error::{StoreError, StoreResult};
pub use identifier::DocumentId;
pub use owner::{DefaultOwnershipResolver, OwnershipResolver, RequestContext};
pub use s3_backend::S3Backend;
pub use store::{DocumentStore, DocumentStoreBuilder, StoreOptions};
pub use types::*;
pub use virus_scan::{HttpVirusScanner, ScanVerdict, VirusScanner};
