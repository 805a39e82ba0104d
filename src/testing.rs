//! In-memory fakes of the remote backends for unit tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::auth::IdentityProvider;
use crate::error::Error;
use crate::firestore::{ArrayValue, Document, DocumentStore, MapValue, Value};

fn to_firestore(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::NullValue(()),
        JsonValue::Bool(b) => Value::BooleanValue(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::IntegerValue(i.to_string()),
            None => Value::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Value::StringValue(s.clone()),
        JsonValue::Array(items) => Value::ArrayValue(ArrayValue {
            values: items.iter().map(to_firestore).collect(),
        }),
        JsonValue::Object(map) => Value::MapValue(MapValue {
            fields: map.iter().map(|(k, v)| (k.clone(), to_firestore(v))).collect(),
        }),
    }
}

#[derive(Default)]
struct Failures {
    reads: HashSet<String>,
    deletes: HashSet<String>,
    queries: HashSet<String>,
    /// collection -> number of deletes that succeed before failing
    deletes_after: HashMap<String, usize>,
}

/// Document store kept in a map, with call counters and injectable failures
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<(String, String), Document>>,
    failures: Mutex<Failures>,
    pub reads: AtomicUsize,
    pub deletes: AtomicUsize,
    pub queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, id: &str, fields: JsonValue) {
        let fields = match to_firestore(&fields) {
            Value::MapValue(m) => m.fields,
            _ => HashMap::new(),
        };
        let doc = Document {
            name: format!("projects/test/databases/(default)/documents/{}/{}", collection, id),
            fields,
            ..Default::default()
        };
        self.docs
            .lock()
            .unwrap()
            .insert((collection.to_string(), id.to_string()), doc);
    }

    /// Insert under a generated id and return it
    pub fn add(&self, collection: &str, fields: JsonValue) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, fields);
        id
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.docs
            .lock()
            .unwrap()
            .contains_key(&(collection.to_string(), id.to_string()))
    }

    pub fn count_where(&self, collection: &str, field: &str, value: &str) -> usize {
        let wanted = Value::from(value);
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|((c, _), doc)| c == collection && doc.fields.get(field) == Some(&wanted))
            .count()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn fail_reads(&self, collection: &str) {
        self.failures.lock().unwrap().reads.insert(collection.to_string());
    }

    pub fn fail_deletes(&self, collection: &str) {
        self.failures.lock().unwrap().deletes.insert(collection.to_string());
    }

    /// Let `n` deletes in `collection` succeed, then fail the rest
    pub fn fail_deletes_after(&self, collection: &str, n: usize) {
        self.failures
            .lock()
            .unwrap()
            .deletes_after
            .insert(collection.to_string(), n);
    }

    pub fn fail_queries(&self, collection: &str) {
        self.failures.lock().unwrap().queries.insert(collection.to_string());
    }

    pub fn heal(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().reads.contains(collection) {
            return Err(Error::database(format!("read of {}/{} refused", collection, id)));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), Error> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = self.failures.lock().unwrap();
            if failures.deletes.contains(collection) {
                return Err(Error::database(format!("delete of {}/{} refused", collection, id)));
            }
            if let Some(remaining) = failures.deletes_after.get_mut(collection) {
                if *remaining == 0 {
                    return Err(Error::database(format!("delete of {}/{} refused", collection, id)));
                }
                *remaining -= 1;
            }
        }
        self.docs
            .lock()
            .unwrap()
            .remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, Error> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failures.lock().unwrap().queries.contains(collection) {
            return Err(Error::database(format!("query on {} refused", collection)));
        }
        let wanted = Value::from(value);
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|((c, _), doc)| c == collection && doc.fields.get(field) == Some(&wanted))
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// How the fake identity provider answers deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Normal,
    Unavailable,
}

/// Identity provider holding a set of uids
pub struct FakeIdentityProvider {
    users: Mutex<HashSet<String>>,
    mode: ProviderMode,
    pub calls: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn with_users(users: &[&str]) -> Self {
        Self {
            users: Mutex::new(users.iter().map(|u| u.to_string()).collect()),
            mode: ProviderMode::Normal,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: ProviderMode::Unavailable,
            ..Self::with_users(&[])
        }
    }

    pub fn has_user(&self, uid: &str) -> bool {
        self.users.lock().unwrap().contains(uid)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn delete_user(&self, user_id: &str) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.mode == ProviderMode::Unavailable {
            return Err(Error::auth("Failed to delete user: UNAVAILABLE"));
        }
        if self.users.lock().unwrap().remove(user_id) {
            Ok(())
        } else {
            Err(Error::UserNotFound(user_id.to_string()))
        }
    }
}
