//! CLI argument definitions using clap
//!
//! Commands:
//! - docvault store --owner <id> --content-type <mime> <file>
//! - docvault fetch --owner <id> <document-id>
//! - docvault delete --owner <id> <document-id>
//! - docvault health
//! - docvault keyring

use clap::{Args, Parser, Subcommand};
use docvault_store::{DocumentId, OwnerId, RequestContext, StoreError, StoreResult};
use std::path::PathBuf;

/// docvault - encrypted, owner-scoped document storage
#[derive(Parser, Debug)]
#[command(name = "docvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file. DOCVAULT_* variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Who the request acts for.
#[derive(Args, Debug, Clone)]
pub struct OwnerArgs {
    /// Owner identity
    #[arg(long)]
    pub owner: String,

    /// Act as this service-account subject on behalf of --owner
    #[arg(long)]
    pub system_subject: Option<String>,
}

impl OwnerArgs {
    pub fn context(&self) -> RequestContext {
        match &self.system_subject {
            Some(subject) => RequestContext::system(subject, &self.owner),
            None => RequestContext::end_user(&self.owner),
        }
    }
}

/// A minted document id or an owner-scoped custom id.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Document id returned by `store`
    #[arg(required_unless_present = "custom_id", conflicts_with = "custom_id")]
    pub id: Option<String>,

    /// Custom id chosen at store time
    #[arg(long)]
    pub custom_id: Option<String>,
}

impl TargetArgs {
    pub fn document_id(&self, owner: &OwnerId) -> StoreResult<DocumentId> {
        match (&self.custom_id, &self.id) {
            (Some(name), _) => DocumentId::custom(owner, name),
            (None, Some(token)) => DocumentId::parse(token),
            (None, None) => Err(StoreError::MalformedIdentifier(
                "no document id given".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encrypt and store a file
    Store {
        #[command(flatten)]
        owner: OwnerArgs,

        /// Declared MIME type of the file
        #[arg(long)]
        content_type: String,

        /// Document title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        /// Store under this owner-scoped name instead of a minted id
        #[arg(long)]
        custom_id: Option<String>,

        /// Requested lifetime in seconds
        #[arg(long)]
        ttl_secs: Option<u64>,

        /// File to upload
        file: PathBuf,
    },

    /// Fetch and decrypt a document
    Fetch {
        #[command(flatten)]
        owner: OwnerArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Write content here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete a document
    Delete {
        #[command(flatten)]
        owner: OwnerArgs,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check that the storage backend is reachable
    Health,

    /// Show the configured key versions
    Keyring,
}
