//! Lookup of the user's profile record and its display form

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::error::Error;
use crate::firestore::{Document, DocumentStore};

/// Primary user-record collection
pub const USERS_COLLECTION: &str = "users";

/// Placeholder for attributes a record does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// The user's profile document, fields kept schema-free
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub fields: Map<String, JsonValue>,
}

impl UserRecord {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id().to_string(),
            fields: document.to_json(),
        }
    }

    /// Display text of a field; `None` if the field is missing or null
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    pub fn created_at(&self) -> Option<String> {
        self.text("createdAt")
    }

    pub fn last_login(&self) -> Option<String> {
        self.text("lastLogin")
    }
}

/// Fetches `users/{uid}`
pub struct RecordLocator<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> RecordLocator<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// `Ok(None)` for a user without a profile record. Errors are
    /// recoverable: callers render the page without account details.
    pub async fn locate(&self, user_id: &str) -> Result<Option<UserRecord>, Error> {
        let document = self.store.get_document(USERS_COLLECTION, user_id).await?;
        Ok(document.as_ref().map(UserRecord::from_document))
    }
}

/// Account information as shown before deletion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDetails {
    pub name: String,
    pub created_at: Option<String>,
    pub last_login: Option<String>,
    /// Problems met while formatting, shown next to the details
    pub warnings: Vec<String>,
}

impl From<&UserRecord> for AccountDetails {
    fn from(record: &UserRecord) -> Self {
        let mut warnings = Vec::new();
        let last_login = record.last_login().map(|raw| match format_timestamp(&raw) {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!(uid = %record.id, "couldn't format lastLogin: {}", e);
                warnings.push(format!("Couldn't format timestamp: {}", e));
                raw
            }
        });

        Self {
            name: record.name().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            created_at: record.created_at(),
            last_login,
            warnings,
        }
    }
}

/// Render an ISO-8601 timestamp as `YYYY-MM-DD HH:MM`
pub fn format_timestamp(raw: &str) -> Result<String, String> {
    const DISPLAY: &str = "%Y-%m-%d %H:%M";

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.format(DISPLAY).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.format(DISPLAY).to_string());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(dt.format(DISPLAY).to_string());
        }
    }
    Err(format!("Invalid isoformat string: '{}'", raw))
}
