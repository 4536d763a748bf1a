use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::dto::{StatusUpdate, StatusUpdateResponse};
use crate::api::error::ServiceError;
use crate::db::filter::Filter;
use crate::db::models::{
    from_document, to_document, ApplicationHistoryEntry, Candidate, APPLICATION_HISTORY,
    CANDIDATES,
};
use crate::db::store::{Document, DocumentStore, ID_FIELD};
use crate::reconciler::JobReconciler;

/// Candidate service: status transitions and their audit trail
pub struct CandidateService {
    store: Arc<dyn DocumentStore>,
    reconciler: Arc<JobReconciler>,
}

impl CandidateService {
    pub fn new(store: Arc<dyn DocumentStore>, reconciler: Arc<JobReconciler>) -> Self {
        Self { store, reconciler }
    }

    /// Change a candidate's status
    ///
    /// # Business Logic
    /// - Sweeps expired jobs first (failures only logged), so the sweep sees
    ///   the status as it was before this change
    /// - Updates status, notes and `last_updated_by`
    /// - Appends an application history entry
    pub async fn update_status(
        &self,
        candidate_id: &str,
        update: &StatusUpdate,
    ) -> Result<StatusUpdateResponse, ServiceError> {
        self.reconciler.reconcile_or_warn("updating candidate status").await;

        let by_key = Filter::new().eq(ID_FIELD, candidate_id);
        let candidate: Candidate = match self.store.find_one(CANDIDATES, &by_key).await? {
            Some(document) => from_document(document)?,
            None => return Err(ServiceError::not_found("Candidate", candidate_id)),
        };

        let mut set = Document::new();
        set.insert("status".to_string(), Value::String(update.status.clone()));
        set.insert(
            "notes".to_string(),
            update.notes.clone().map(Value::String).unwrap_or(Value::Null),
        );
        set.insert(
            "last_updated_by".to_string(),
            update.updated_by.clone().map(Value::String).unwrap_or(Value::Null),
        );

        if self.store.update_one(CANDIDATES, &by_key, set).await? == 0 {
            return Err(ServiceError::not_found("Candidate", candidate_id));
        }

        let entry = ApplicationHistoryEntry {
            id: None,
            candidate_id: candidate_id.to_string(),
            job_id: candidate.job_id.clone(),
            old_status: candidate.status.clone(),
            new_status: update.status.clone(),
            updated_by: update.updated_by.clone(),
            timestamp: Utc::now(),
            comment: update.notes.clone(),
        };
        self.store
            .insert_one(APPLICATION_HISTORY, to_document(&entry)?)
            .await?;

        info!(
            "Service: candidate {} moved from {} to {}",
            candidate_id, candidate.status, update.status
        );

        Ok(StatusUpdateResponse {
            message: "Candidate status updated successfully".to_string(),
            candidate_id: candidate_id.to_string(),
            old_status: candidate.status,
            new_status: update.status.clone(),
        })
    }
}
