use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::dto::{JobListQuery, JobListResponse};
use crate::api::error::ServiceError;
use crate::db::filter::Filter;
use crate::db::models::{from_document, Job, JobStatus, JOBS, JOB_HISTORY};
use crate::db::store::{document_id, DocumentStore, FindOptions, SortOrder, ID_FIELD};
use crate::reconciler::JobReconciler;

/// Jobs returned by a listing when the caller gives no limit
const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 500;

/// Job service containing read logic for live jobs
pub struct JobService {
    store: Arc<dyn DocumentStore>,
    reconciler: Arc<JobReconciler>,
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(store: Arc<dyn DocumentStore>, reconciler: Arc<JobReconciler>) -> Self {
        Self { store, reconciler }
    }

    /// List live jobs, newest first
    ///
    /// Ordered by the `created_at` stamp job creation writes; jobs without one
    /// come after those with one, most recently inserted first.
    ///
    /// # Business Logic
    /// - Sweeps expired jobs first (failures only logged)
    /// - Filters by status and assigned HR
    /// - Hides live rows that already have a history record
    pub async fn list_jobs(&self, query: &JobListQuery) -> Result<JobListResponse, ServiceError> {
        self.reconciler.reconcile_or_warn("listing jobs").await;

        let mut filter = Filter::new();
        if let Some(status) = &query.status {
            let status: JobStatus = status.parse().map_err(ServiceError::Validation)?;
            filter = filter.eq("status", status.as_str());
        }
        if let Some(hr) = &query.assigned_hr {
            filter = filter.eq("assigned_hr", hr.as_str());
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let documents = self
            .store
            .find(
                JOBS,
                &filter,
                FindOptions::limit(limit).sorted_by("created_at", SortOrder::Descending),
            )
            .await?;

        let archived = self.archived_keys(documents.iter().filter_map(document_id)).await?;

        let mut jobs = Vec::with_capacity(documents.len());
        for document in documents {
            if document_id(&document).is_some_and(|key| archived.contains(key)) {
                continue;
            }
            match from_document::<Job>(document) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!("Skipping malformed job in listing: {}", e),
            }
        }

        info!("Service: listed {} jobs", jobs.len());
        Ok(JobListResponse {
            count: jobs.len(),
            jobs,
        })
    }

    /// Fetch one job by its `job_id`, falling back to its storage key
    pub async fn get_job(&self, job_id: &str) -> Result<Job, ServiceError> {
        self.reconciler.reconcile_or_warn("fetching a job").await;

        let document = match self
            .store
            .find_one(JOBS, &Filter::new().eq("job_id", job_id))
            .await?
        {
            Some(document) => document,
            None => self
                .store
                .find_one(JOBS, &Filter::new().eq(ID_FIELD, job_id))
                .await?
                .ok_or_else(|| ServiceError::not_found("Job", job_id))?,
        };

        if let Some(key) = document_id(&document) {
            if !self.archived_keys(std::iter::once(key)).await?.is_empty() {
                info!("Service: job {} is already archived", job_id);
                return Err(ServiceError::not_found("Job", job_id));
            }
        }

        Ok(from_document(document)?)
    }

    /// Storage keys among `keys` that already have a history record
    async fn archived_keys<'a>(
        &self,
        keys: impl Iterator<Item = &'a str>,
    ) -> Result<HashSet<String>, ServiceError> {
        let keys: Vec<&str> = keys.collect();
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let history = self
            .store
            .find(
                JOB_HISTORY,
                &Filter::new().is_in("original_job_id", keys),
                FindOptions::default(),
            )
            .await?;

        Ok(history
            .iter()
            .filter_map(|record| record.get("original_job_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}
