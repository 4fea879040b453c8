//! Resolving who a request acts on behalf of.
//!
//! End users own their own documents. System callers (service accounts)
//! act on behalf of an explicitly named owner, and may be restricted to an
//! allowlist of subjects.

use crate::error::{StoreError, StoreResult};
use crate::types::OwnerId;
use tracing::{trace, warn};

/// What the transport layer learned about the caller.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Authenticated subject of the caller's token.
    pub subject: Option<String>,
    /// Whether the caller is a service account rather than an end user.
    pub acts_as_system: bool,
    /// Owner named explicitly by a system caller.
    pub requested_owner: Option<String>,
}

impl RequestContext {
    pub fn end_user(subject: &str) -> Self {
        Self {
            subject: Some(subject.to_string()),
            acts_as_system: false,
            requested_owner: None,
        }
    }

    pub fn system(subject: &str, owner: &str) -> Self {
        Self {
            subject: Some(subject.to_string()),
            acts_as_system: true,
            requested_owner: Some(owner.to_string()),
        }
    }
}

pub trait OwnershipResolver: Send + Sync {
    fn resolve(&self, ctx: &RequestContext) -> StoreResult<OwnerId>;
}

/// Subjects-allowlist resolver. An empty allowlist admits every system
/// subject.
#[derive(Clone, Debug, Default)]
pub struct DefaultOwnershipResolver {
    authorized_subjects: Vec<String>,
}

impl DefaultOwnershipResolver {
    pub fn new(authorized_subjects: Vec<String>) -> Self {
        Self {
            authorized_subjects,
        }
    }

    fn is_authorized(&self, subject: &str) -> bool {
        self.authorized_subjects.is_empty() || self.authorized_subjects.iter().any(|s| s == subject)
    }
}

impl OwnershipResolver for DefaultOwnershipResolver {
    fn resolve(&self, ctx: &RequestContext) -> StoreResult<OwnerId> {
        let subject = ctx
            .subject
            .as_deref()
            .ok_or_else(|| StoreError::OwnerUnresolved("request has no subject".to_string()))?;

        if !ctx.acts_as_system {
            return OwnerId::new(subject);
        }

        if !self.is_authorized(subject) {
            warn!("subject {subject} is not among the authorized subjects");
            return Err(StoreError::OwnerUnresolved(format!(
                "subject {subject} may not act on behalf of owners"
            )));
        }

        let owner = ctx.requested_owner.as_deref().ok_or_else(|| {
            StoreError::OwnerUnresolved("system requests must name an owner".to_string())
        })?;
        trace!("system subject {subject} acting on behalf of an owner");
        OwnerId::new(owner)
    }
}
