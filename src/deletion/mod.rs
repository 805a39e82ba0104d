//! Permanent deletion of a user's account and data
//!
//! A deletion runs three phases in order:
//!
//! 1. the login account is removed from the identity provider,
//! 2. the user's own documents are purged from the owned collections,
//! 3. documents referencing the user are purged.
//!
//! Only a failure on a required collection in phase 2 fails the deletion and
//! skips phase 3. Everything else is recorded in [`DeletionResult::warnings`].
//! Phases are not transactional; running the deletion again after a failure
//! is safe because every phase is idempotent.

mod plan;
mod purge;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{IdentityProvider, UserIdentity};
use crate::firestore::DocumentStore;

pub use plan::*;
pub use purge::*;

/// Support contact shown with failed deletions
pub const SUPPORT_CONTACT: &str = "yinon.h21+quizdom@gmail.com";

/// What a deletion did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionResult {
    /// False only when a required collection could not be purged
    pub success: bool,
    /// The login account is gone (or never existed)
    pub auth_deleted: bool,
    /// Owned collections whose document was deleted, in plan order
    pub collections_deleted: Vec<String>,
    /// Referencing documents deleted
    pub related_docs_deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl DeletionResult {
    /// Human-readable summary for the end of the deletion flow
    pub fn summary(&self) -> String {
        if !self.success {
            return format!(
                "Failed to delete your account: {}\nPlease try again or contact support ({}) if the problem persists.",
                self.error.as_deref().unwrap_or("unknown error"),
                SUPPORT_CONTACT
            );
        }

        let mut lines = vec![
            "Your account has been successfully deleted!".to_string(),
            "Deletion Summary:".to_string(),
            format!(
                "Authentication: {}",
                if self.auth_deleted { "Deleted" } else { "Failed" }
            ),
            format!("Collections deleted: {}", self.collections_deleted.len()),
        ];
        lines.extend(self.collections_deleted.iter().map(|c| format!("  - {}", c)));
        lines.push(format!(
            "Related documents deleted: {}",
            self.related_docs_deleted
        ));
        lines.extend(self.warnings.iter().map(|w| format!("Warning: {}", w)));
        lines.join("\n")
    }
}

/// Runs the three deletion phases against the given backends
pub struct AccountDeletion<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
    plan: DeletionPlan,
}

impl<'a> AccountDeletion<'a> {
    pub fn new(identity: &'a dyn IdentityProvider, store: &'a dyn DocumentStore) -> Self {
        Self::with_plan(identity, store, DeletionPlan::default())
    }

    pub fn with_plan(
        identity: &'a dyn IdentityProvider,
        store: &'a dyn DocumentStore,
        plan: DeletionPlan,
    ) -> Self {
        Self {
            identity,
            store,
            plan,
        }
    }

    /// Delete everything belonging to `user`. Consumes the identity: the
    /// session ends with the deletion whatever the outcome.
    pub async fn run(&self, user: UserIdentity) -> DeletionResult {
        let uid = user.identifier.as_str();
        let mut warnings = Vec::new();

        info!(%uid, "deleting identity provider account");
        let auth_deleted = match self.identity.delete_user(uid).await {
            Ok(()) => true,
            Err(e) if e.is_user_not_found() => {
                warn!(%uid, "account already absent from identity provider");
                warnings.push(
                    "User not found in the identity provider, but will still clean up stored data."
                        .to_string(),
                );
                true
            }
            Err(e) => {
                warn!(%uid, "identity provider deletion failed: {}", e);
                warnings.push(format!(
                    "Error deleting user from the identity provider: {}",
                    e.message()
                ));
                false
            }
        };

        info!(%uid, "purging owned collections");
        let owned = match CollectionPurger::new(self.store, self.plan.owned)
            .purge(uid)
            .await
        {
            Ok(owned) => owned,
            Err(e) => {
                warn!(%uid, "deletion aborted: {}", e);
                let PurgeError::Fatal { ref deleted, .. } = e;
                return DeletionResult {
                    success: false,
                    auth_deleted,
                    collections_deleted: deleted.clone(),
                    related_docs_deleted: 0,
                    error: Some(e.to_string()),
                    warnings,
                };
            }
        };
        warnings.extend(owned.warnings);

        info!(%uid, "purging referencing documents");
        let references = ReferencePurger::new(self.store, self.plan.referencing)
            .purge(uid)
            .await;
        warnings.extend(references.warnings);

        info!(
            %uid,
            collections = owned.deleted.len(),
            related = references.deleted,
            "account deletion finished"
        );

        DeletionResult {
            success: true,
            auth_deleted,
            collections_deleted: owned.deleted,
            related_docs_deleted: references.deleted,
            error: None,
            warnings,
        }
    }
}
