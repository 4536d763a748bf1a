use serde::{Deserialize, Serialize};
use crate::db::models::Job;

/// Query string of `GET /jobs`
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub assigned_hr: Option<String>,
    pub limit: Option<usize>,
}

/// Response for job listing
#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponse {
    pub count: usize,
    pub jobs: Vec<Job>,
}
