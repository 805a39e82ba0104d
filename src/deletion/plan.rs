//! Which collections hold a user's data

use crate::account::USERS_COLLECTION;

/// What happens when purging a collection fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole deletion
    Required,
    /// Record a warning and go on with the next collection
    BestEffort,
}

/// A collection whose documents are keyed by the user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedCollection {
    pub name: &'static str,
    pub policy: FailurePolicy,
}

impl OwnedCollection {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            policy: FailurePolicy::Required,
        }
    }

    pub const fn best_effort(name: &'static str) -> Self {
        Self {
            name,
            policy: FailurePolicy::BestEffort,
        }
    }
}

/// A collection whose documents point at the user through `field`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencingCollection {
    pub collection: &'static str,
    pub field: &'static str,
}

/// Owned collections, purged in this order
pub const OWNED_COLLECTIONS: &[OwnedCollection] = &[
    OwnedCollection::required(USERS_COLLECTION),
    OwnedCollection::required("userStatistics"),
    OwnedCollection::best_effort("userPreferences"),
    OwnedCollection::best_effort("gameHistory"),
    OwnedCollection::best_effort("userAchievements"),
];

/// Rooms the user created and their matchmaking presence
pub const REFERENCING_COLLECTIONS: &[ReferencingCollection] = &[
    ReferencingCollection {
        collection: "triviaRooms",
        field: "createdBy",
    },
    ReferencingCollection {
        collection: "availablePlayers",
        field: "userId",
    },
];

/// The full set of collections a deletion touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionPlan {
    pub owned: &'static [OwnedCollection],
    pub referencing: &'static [ReferencingCollection],
}

impl Default for DeletionPlan {
    fn default() -> Self {
        Self {
            owned: OWNED_COLLECTIONS,
            referencing: REFERENCING_COLLECTIONS,
        }
    }
}
