use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::filter::Filter;

/// A schemaless document as stored in a collection.
///
/// Documents returned by a store always carry their storage key under [`ID_FIELD`].
pub type Document = Map<String, Value>;

/// Field holding the store-assigned primary key of a document.
pub const ID_FIELD: &str = "_id";

/// Errors raised by a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all (connection refused, pool closed, I/O failure)
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A unique index rejected the write
    #[error("duplicate key in collection '{collection}'")]
    Duplicate { collection: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Whether this error means the whole store is unusable rather than a single document.
    pub fn is_systemic(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate {
                    collection: db_err.table().unwrap_or("documents").to_string(),
                }
            }
            other => StoreError::Database(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Paging and ordering for [`DocumentStore::find`]
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub sort: Option<(String, SortOrder)>,
}

impl FindOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sorted_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }
}

/// Collection-level access to a document database.
///
/// Each single-document operation is atomic on its own; nothing spans
/// more than one call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let mut found = self.find(collection, filter, FindOptions::limit(1)).await?;
        Ok(found.pop())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert a document and return its storage key.
    ///
    /// A string `_id` already present in `document` is used as the key;
    /// otherwise the store assigns a fresh one.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Merge `set` into the first document matching `filter`. Returns the matched count.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Round-trip to the backend, used by readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Storage key of a document returned by a store.
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Fresh storage key for backends that assign keys client-side.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
