pub mod memory;
pub mod postgres;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use self::memory::MemoryStore;

/// One stored entity as the persistence collaborator sees it.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: String,
    pub id: Uuid,
    pub version: i64,
    /// Natural key that must be unique within `kind` (e.g. one attendance
    /// record per occurrence).
    pub unique_key: Option<String>,
    pub body: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting write")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("undecodable record: {0}")]
    Decode(String),
}

/// Persistence collaborator. Implementations must make `update` a
/// compare-and-swap on `expected_version` and reject duplicate
/// `(kind, unique_key)` pairs on `insert`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, kind: &str, id: Uuid) -> Result<Document, StoreError>;

    /// Documents of `kind` whose body contains `filter` (JSON containment),
    /// in insertion order.
    async fn find(&self, kind: &str, filter: &Value) -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, doc: Document) -> Result<(), StoreError>;

    async fn update(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// A type the engine persists through a [`Store`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Entities that change after creation; every update is a CAS on `version`.
pub trait Versioned: Entity {
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}

/// Field-equality filter matched by JSON containment.
///
/// Building never fails; a value that cannot be serialized poisons the
/// filter and the query using it fails with [`StoreError::Decode`].
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: Map<String, Value>,
    error: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, field: &str, value: impl Serialize) -> Self {
        self.with(field, value, |v| v)
    }

    /// Matches when the array at `field` has an element containing `value`.
    pub fn has(self, field: &str, value: impl Serialize) -> Self {
        self.with(field, value, |v| Value::Array(vec![v]))
    }

    fn with(mut self, field: &str, value: impl Serialize, wrap: fn(Value) -> Value) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.fields.insert(field.to_string(), wrap(v));
            }
            Err(e) => {
                self.error.get_or_insert_with(|| format!("filter on `{field}`: {e}"));
            }
        }
        self
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        match &self.error {
            Some(e) => Err(StoreError::Decode(e.clone())),
            None => Ok(Value::Object(self.fields.clone())),
        }
    }
}

/// Typed handle over a [`Store`]; every call is bounded by `timeout`.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl Db {
    pub fn new(store: Arc<dyn Store>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Duration::from_secs(2))
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                warn!("store {op} timed out after {:?}", self.timeout);
                Err(StoreError::Unavailable(format!(
                    "{op} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    pub async fn get<E: Entity>(&self, id: Uuid) -> Result<E, StoreError> {
        let doc = self.bounded("get", self.store.get(E::KIND, id)).await?;
        decode(doc)
    }

    pub async fn find<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
        let filter = filter.to_value()?;
        let docs = self.bounded("find", self.store.find(E::KIND, &filter)).await?;
        docs.into_iter().map(decode).collect()
    }

    pub async fn insert<E: Entity>(&self, record: &E) -> Result<(), StoreError> {
        let doc = Document {
            kind: E::KIND.to_string(),
            id: record.id(),
            version: 0,
            unique_key: record.unique_key(),
            body: encode(record)?,
        };
        self.bounded("insert", self.store.insert(doc)).await
    }

    /// Write `record` if the stored version still equals `record.version()`.
    /// On success the record carries its new version.
    pub async fn update<E: Versioned>(&self, record: &mut E) -> Result<(), StoreError> {
        let expected = record.version();
        record.set_version(expected + 1);
        let res = match encode(&*record) {
            Ok(body) => {
                self.bounded(
                    "update",
                    self.store.update(E::KIND, record.id(), expected, body),
                )
                .await
            }
            Err(e) => Err(e),
        };
        if res.is_err() {
            record.set_version(expected);
        }
        res
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", self.store.ping()).await
    }
}

fn encode<E: Serialize>(record: &E) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))
}

fn decode<E: DeserializeOwned>(doc: Document) -> Result<E, StoreError> {
    serde_json::from_value(doc.body)
        .map_err(|e| StoreError::Decode(format!("{} {}: {e}", doc.kind, doc.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Counter {
        id: Uuid,
        owner: String,
        value: i32,
        version: i64,
    }

    impl Entity for Counter {
        const KIND: &'static str = "counter";
        fn id(&self) -> Uuid {
            self.id
        }
        fn unique_key(&self) -> Option<String> {
            Some(self.owner.clone())
        }
    }

    impl Versioned for Counter {
        fn version(&self) -> i64 {
            self.version
        }
        fn set_version(&mut self, version: i64) {
            self.version = version;
        }
    }

    fn counter(owner: &str) -> Counter {
        Counter { id: Uuid::new_v4(), owner: owner.into(), value: 0, version: 0 }
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let db = Db::in_memory();
        let c = counter("ada");
        db.insert(&c).await.unwrap();

        let mut first: Counter = db.get(c.id).await.unwrap();
        let mut second: Counter = db.get(c.id).await.unwrap();

        first.value = 1;
        db.update(&mut first).await.unwrap();
        assert_eq!(first.version, 1);

        second.value = 2;
        let err = db.update(&mut second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(second.version, 0, "failed update must not bump the local version");

        let stored: Counter = db.get(c.id).await.unwrap();
        assert_eq!(stored.value, 1);
    }

    #[tokio::test]
    async fn unique_key_is_enforced_on_insert() {
        let db = Db::in_memory();
        db.insert(&counter("ada")).await.unwrap();
        let err = db.insert(&counter("ada")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        db.insert(&counter("grace")).await.unwrap();
    }

    #[tokio::test]
    async fn filter_matches_by_field() {
        let db = Db::in_memory();
        db.insert(&counter("ada")).await.unwrap();
        db.insert(&counter("grace")).await.unwrap();

        let found: Vec<Counter> = db.find(&Filter::new().eq("owner", "grace")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner, "grace");

        let all: Vec<Counter> = db.find(&Filter::new()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn filter_has_wraps_value_in_array() {
        let f = Filter::new().has("entries", json!({ "student_id": "s1" }));
        assert_eq!(f.to_value().unwrap(), json!({ "entries": [{ "student_id": "s1" }] }));
    }

    #[tokio::test]
    async fn unserializable_filter_fails_the_query() {
        use std::collections::HashMap;

        let db = Db::in_memory();
        db.insert(&counter("ada")).await.unwrap();

        // JSON object keys must be strings.
        let bad: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);
        let filter = Filter::new().eq("owner", "ada").eq("value", bad);

        let err = db.find::<Counter>(&filter).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
