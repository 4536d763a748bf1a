pub mod filter;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StoreBackend};
use memory::MemoryStore;
use models::JOB_HISTORY;
use postgres::PgDocumentStore;
use store::{DocumentStore, StoreError};

/// Open the configured document store, migrating PostgreSQL on the way.
pub async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store (data is lost on exit)");
            Ok(Arc::new(
                MemoryStore::new().with_unique_index(JOB_HISTORY, "original_job_id"),
            ))
        }
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::Unavailable("DATABASE_URL is not configured".to_string())
            })?;
            let store = PgDocumentStore::connect(database_url, config.max_db_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
