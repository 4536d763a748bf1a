use std::sync::Arc;

use tracing::{info, warn};

use super::dto::{DeleteHistoryResponse, HistoryPage, HistoryQuery, Pagination};
use crate::api::error::ServiceError;
use crate::db::filter::Filter;
use crate::db::models::{from_document, JobHistoryRecord, JOB_HISTORY};
use crate::db::store::{DocumentStore, FindOptions, SortOrder, ID_FIELD};

const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 200;

/// Read and prune access to archived jobs
pub struct HistoryService {
    store: Arc<dyn DocumentStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// One page of history records, most recently archived first
    pub async fn list(&self, query: &HistoryQuery) -> Result<HistoryPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let skip = (page - 1).saturating_mul(limit);

        let all = Filter::new();
        let total_jobs = self.store.count(JOB_HISTORY, &all).await?;
        let documents = self
            .store
            .find(
                JOB_HISTORY,
                &all,
                FindOptions::limit(limit as usize)
                    .with_skip(skip as usize)
                    .sorted_by("moved_to_history_date", SortOrder::Descending),
            )
            .await?;

        let jobs: Vec<JobHistoryRecord> = documents
            .into_iter()
            .filter_map(|document| match from_document(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed history record: {}", e);
                    None
                }
            })
            .collect();

        Ok(HistoryPage {
            jobs,
            pagination: Pagination {
                page,
                limit,
                total_jobs,
                total_pages: total_jobs.div_ceil(limit),
            },
        })
    }

    /// Delete the history records with the given storage keys
    pub async fn delete_records(&self, ids: &[String]) -> Result<DeleteHistoryResponse, ServiceError> {
        let filter = Filter::new().is_in(ID_FIELD, ids.iter().map(String::as_str));
        let deleted_count = self.store.delete_many(JOB_HISTORY, &filter).await?;

        info!("Service: deleted {} of {} requested history records", deleted_count, ids.len());
        Ok(DeleteHistoryResponse {
            message: format!("Successfully deleted {} job history records", deleted_count),
            deleted_count,
        })
    }
}
