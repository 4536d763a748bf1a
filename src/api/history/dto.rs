use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::JobHistoryRecord;

/// Query string of `GET /job-history`
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total_jobs: u64,
    pub total_pages: u64,
}

/// One page of archived jobs, newest archival first
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPage {
    pub jobs: Vec<JobHistoryRecord>,
    pub pagination: Pagination,
}

/// Body of `DELETE /job-history`
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DeleteHistoryRequest {
    #[validate(length(min = 1, max = 1000, message = "ids must contain between 1 and 1000 entries"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteHistoryResponse {
    pub message: String,
    pub deleted_count: u64,
}
