//! Removal of owned and referencing documents

use thiserror::Error as ThisError;
use tracing::{debug, warn};

use super::plan::{FailurePolicy, OwnedCollection, ReferencingCollection};
use crate::error::Error;
use crate::firestore::DocumentStore;

/// Failure that aborts the deletion
#[derive(ThisError, Debug)]
pub enum PurgeError {
    #[error("Failed to delete user data from Firestore: {source}")]
    Fatal {
        /// Collection whose read or delete failed
        collection: &'static str,
        /// Collections already deleted when the failure happened
        deleted: Vec<String>,
        #[source]
        source: Error,
    },
}

/// Outcome of purging the owned collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedPurge {
    /// Collections whose document existed and was deleted, in plan order
    pub deleted: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of purging referencing documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePurge {
    /// Documents actually deleted. Undercounts when some deletes failed.
    pub deleted: usize,
    pub warnings: Vec<String>,
}

/// Deletes the user's own document from every owned collection
pub struct CollectionPurger<'a> {
    store: &'a dyn DocumentStore,
    collections: &'a [OwnedCollection],
}

impl<'a> CollectionPurger<'a> {
    pub fn new(store: &'a dyn DocumentStore, collections: &'a [OwnedCollection]) -> Self {
        Self { store, collections }
    }

    /// Purge in plan order. A failure on a required collection returns
    /// [`PurgeError::Fatal`] right away; failures on best-effort collections
    /// become warnings.
    pub async fn purge(&self, user_id: &str) -> Result<OwnedPurge, PurgeError> {
        let mut outcome = OwnedPurge::default();

        for collection in self.collections {
            match self.purge_one(collection.name, user_id).await {
                Ok(true) => outcome.deleted.push(collection.name.to_string()),
                Ok(false) => debug!(collection = collection.name, "no document, skipping"),
                Err(source) => match collection.policy {
                    FailurePolicy::Required => {
                        return Err(PurgeError::Fatal {
                            collection: collection.name,
                            deleted: outcome.deleted,
                            source,
                        });
                    }
                    FailurePolicy::BestEffort => {
                        warn!(collection = collection.name, "skipping after error: {}", source);
                        outcome.warnings.push(format!(
                            "Could not delete {} data: {}",
                            collection.name,
                            source.message()
                        ));
                    }
                },
            }
        }

        Ok(outcome)
    }

    /// `Ok(true)` when a document existed and is now gone
    async fn purge_one(&self, collection: &str, user_id: &str) -> Result<bool, Error> {
        if self.store.get_document(collection, user_id).await?.is_none() {
            return Ok(false);
        }
        self.store.delete_document(collection, user_id).await?;
        Ok(true)
    }
}

/// Deletes documents that reference the user from other collections
pub struct ReferencePurger<'a> {
    store: &'a dyn DocumentStore,
    references: &'a [ReferencingCollection],
}

impl<'a> ReferencePurger<'a> {
    pub fn new(store: &'a dyn DocumentStore, references: &'a [ReferencingCollection]) -> Self {
        Self { store, references }
    }

    /// Query and delete per reference. A failure stops that reference only.
    pub async fn purge(&self, user_id: &str) -> ReferencePurge {
        let mut outcome = ReferencePurge::default();

        for reference in self.references {
            if let Err(e) = self.purge_reference(reference, user_id, &mut outcome.deleted).await {
                warn!(
                    collection = reference.collection,
                    field = reference.field,
                    "reference purge incomplete: {}",
                    e
                );
                outcome.warnings.push(format!(
                    "Some {} documents might not have been deleted: {}",
                    reference.collection,
                    e.message()
                ));
            }
        }

        outcome
    }

    async fn purge_reference(
        &self,
        reference: &ReferencingCollection,
        user_id: &str,
        deleted: &mut usize,
    ) -> Result<(), Error> {
        let documents = self
            .store
            .find_by_field(reference.collection, reference.field, user_id)
            .await?;

        for document in &documents {
            self.store
                .delete_document(reference.collection, document.id())
                .await?;
            *deleted += 1;
        }
        Ok(())
    }
}
