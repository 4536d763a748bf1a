use std::sync::Arc;

use actix_web::web::ServiceConfig;
use serde_json::Value;

use super::AppState;
use crate::db::memory::MemoryStore;
use crate::db::models::JOB_HISTORY;
use crate::db::store::{Document, DocumentStore};
use crate::reconciler::{JobReconciler, ReconcilerConfig};

/// Application wired to an in-memory store
pub struct TestApp {
    pub memory: Arc<MemoryStore>,
    pub store: Arc<dyn DocumentStore>,
    state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ReconcilerConfig::default())
    }

    pub fn with_config(config: ReconcilerConfig) -> Self {
        let memory = Arc::new(MemoryStore::new().with_unique_index(JOB_HISTORY, "original_job_id"));
        let store: Arc<dyn DocumentStore> = memory.clone();
        let reconciler = Arc::new(JobReconciler::new(store.clone(), config));
        Self {
            memory,
            store: store.clone(),
            state: AppState::new(store, reconciler),
        }
    }

    pub fn configure(&self, config: &mut ServiceConfig) {
        self.state.configure(config);
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("test document must be an object, got {}", other),
    }
}

/// Insert a JSON object and return its storage key
pub async fn seed(store: &Arc<dyn DocumentStore>, collection: &str, value: Value) -> String {
    store.insert_one(collection, doc(value)).await.unwrap()
}
