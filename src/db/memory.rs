use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::filter::{compare, Filter};
use super::store::{
    document_id, new_document_id, Document, DocumentStore, FindOptions, SortOrder, StoreError,
    ID_FIELD,
};

/// In-process document store.
///
/// Collections keep insertion order. Used by the test suite and for running
/// the service without a database (`STORE_BACKEND=memory`).
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    unique_fields: HashMap<String, Vec<String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts whose `field` value already exists in `collection`.
    pub fn with_unique_index(mut self, collection: &str, field: &str) -> Self {
        self.unique_fields
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Simulate losing (or regaining) the connection to the store.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn violates_unique(&self, collection: &str, existing: &[Document], document: &Document) -> bool {
        let mut fields = vec![ID_FIELD];
        if let Some(extra) = self.unique_fields.get(collection) {
            fields.extend(extra.iter().map(String::as_str));
        }

        fields.into_iter().any(|field| match document.get(field) {
            None | Some(Value::Null) => false,
            Some(value) => existing.iter().any(|doc| doc.get(field) == Some(value)),
        })
    }
}

/// Rank of a value's type, in the order PostgreSQL sorts jsonb; a missing field counts as null.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Sort by `field`; ties keep insertion order, reversed for a descending sort.
fn sort_documents(documents: &mut [Document], field: &str, order: SortOrder) {
    if order == SortOrder::Descending {
        documents.reverse();
    }
    documents.sort_by(|a, b| {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = type_rank(left)
            .cmp(&type_rank(right))
            .then_with(|| compare(left, right).unwrap_or(Ordering::Equal));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;
        let collections = self.collections.read().await;

        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();

        if let Some((field, order)) = &options.sort {
            sort_documents(&mut found, field, *order);
        }

        let skip = options.skip.unwrap_or(0);
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_available()?;
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<String, StoreError> {
        self.check_available()?;

        let id = match document_id(&document) {
            Some(id) => id.to_string(),
            None => new_document_id(),
        };
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if self.violates_unique(collection, docs, &document) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
            });
        }
        docs.push(document);

        debug!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let Some(target) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)))
        else {
            return Ok(0);
        };

        for (key, value) in set {
            if key != ID_FIELD {
                target.insert(key, value);
            }
        }
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
