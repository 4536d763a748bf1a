use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::{Document, StoreError};

/// Live job postings
pub const JOBS: &str = "jobs";
/// Candidate applications, referencing jobs by `job_id`
pub const CANDIDATES: &str = "candidates";
/// Archived copies of expired jobs
pub const JOB_HISTORY: &str = "job_history";
/// Audit trail of candidate status changes
pub const APPLICATION_HISTORY: &str = "application_history";

/// Format of `end_date`. Fixed-width and zero-padded, so string order is date order.
pub const END_DATE_FORMAT: &str = "%Y-%m-%d";

/// Job status enum representing the lifecycle of a posting
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "demand closed", alias = "demand_closed")]
    DemandClosed,
    #[serde(rename = "allocated")]
    Allocated,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Submitted => "submitted",
            JobStatus::DemandClosed => "demand closed",
            JobStatus::Allocated => "allocated",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            "submitted" => Ok(JobStatus::Submitted),
            "demand closed" | "demand_closed" => Ok(JobStatus::DemandClosed),
            "allocated" => Ok(JobStatus::Allocated),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// A job posting as stored in the `jobs` collection.
///
/// Only the fields the lifecycle logic reads are typed; title, description,
/// location, compensation and anything else ride along in `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub job_id: String,
    pub status: JobStatus,
    pub end_date: String,
    /// Everything else, `assigned_hr` included, kept exactly as stored
    #[serde(flatten)]
    pub attributes: Document,
}

/// A candidate application as stored in the `candidates` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub job_id: String,
    #[serde(default = "default_candidate_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(flatten)]
    pub attributes: Document,
}

fn default_candidate_status() -> String {
    "applied".to_string()
}

/// Archived copy of a job, written only by the reconciler.
///
/// Carries the full job payload with `status` forced to the archived value.
/// `original_job_id` is the storage key of the job it replaced and is the
/// only durable link back to it once the live row is gone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobHistoryRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub original_job_id: String,
    pub moved_to_history_date: DateTime<Utc>,
    pub moved_to_history_reason: String,
    pub job_id: String,
    pub status: JobStatus,
    pub end_date: String,
    #[serde(flatten)]
    pub attributes: Document,
}

impl JobHistoryRecord {
    /// Build the archival copy of `job`. The record's own key is left for the store to assign.
    pub fn archive(
        job: &Job,
        original_job_id: &str,
        moved_at: DateTime<Utc>,
        reason: &str,
        archived_status: JobStatus,
    ) -> Self {
        Self {
            id: None,
            original_job_id: original_job_id.to_string(),
            moved_to_history_date: moved_at,
            moved_to_history_reason: reason.to_string(),
            job_id: job.job_id.clone(),
            status: archived_status,
            end_date: job.end_date.clone(),
            attributes: job.attributes.clone(),
        }
    }
}

/// One candidate status transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationHistoryEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub candidate_id: String,
    pub job_id: String,
    pub old_status: String,
    pub new_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Decode a stored document into a typed model.
pub fn from_document<T: serde::de::DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Encode a typed model as a document ready for insertion.
pub fn to_document<T: Serialize>(model: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "model serialized to a non-object value: {}",
            other
        ))),
    }
}
