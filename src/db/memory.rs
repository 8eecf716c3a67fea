//! In-memory store for development runs and tests

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Document, Store, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, kind: &str, id: Uuid) -> Result<Document, StoreError> {
        let docs = self.docs.read().await;
        docs.iter()
            .find(|d| d.kind == kind && d.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find(&self, kind: &str, filter: &Value) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|d| d.kind == kind && json_contains(&d.body, filter))
            .cloned()
            .collect())
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let clash = docs.iter().any(|d| {
            d.kind == doc.kind
                && (d.id == doc.id
                    || (doc.unique_key.is_some() && d.unique_key == doc.unique_key))
        });
        if clash {
            return Err(StoreError::Conflict);
        }
        docs.push(doc);
        Ok(())
    }

    async fn update(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .iter_mut()
            .find(|d| d.kind == kind && d.id == id)
            .ok_or(StoreError::NotFound)?;
        if doc.version != expected_version {
            return Err(StoreError::Conflict);
        }
        doc.version = expected_version + 1;
        doc.body = body;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Same semantics as Postgres `jsonb @>`: objects match key-wise, arrays
/// match when every pattern element is contained in some document element.
pub(crate) fn json_contains(doc: &Value, pattern: &Value) -> bool {
    match (doc, pattern) {
        (Value::Object(d), Value::Object(p)) => p
            .iter()
            .all(|(k, pv)| d.get(k).is_some_and(|dv| json_contains(dv, pv))),
        (Value::Array(d), Value::Array(p)) => p
            .iter()
            .all(|pv| d.iter().any(|dv| json_contains(dv, pv))),
        _ => doc == pattern,
    }
}
