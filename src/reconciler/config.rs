use std::str::FromStr;
use std::time::Duration;

use crate::db::models::JobStatus;

/// What happens to an expired job nobody was placed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryAction {
    /// Copy the job into `job_history`, then delete the live row
    Archive,
    /// Leave the job in place and set its status to the archived status
    MarkClosed,
}

impl FromStr for ExpiryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "archive" => Ok(ExpiryAction::Archive),
            "mark_closed" => Ok(ExpiryAction::MarkClosed),
            other => Err(format!(
                "unknown expiry action '{}', expected 'archive' or 'mark_closed'",
                other
            )),
        }
    }
}

/// Tunables of the job lifecycle reconciler
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Candidate statuses that keep an expired job live
    pub qualifying_statuses: Vec<String>,

    /// Maximum expired jobs examined per sweep; the rest wait for the next one
    pub scan_limit: usize,

    /// Stored as `moved_to_history_reason`
    pub archive_reason: String,

    /// Status written on archived (or closed-in-place) jobs
    pub archived_status: JobStatus,

    pub expiry_action: ExpiryAction,

    /// Make overlapping sweeps in this process wait for each other
    pub serialize_sweeps: bool,

    /// Period of the background sweep
    pub interval: Duration,

    /// Upper bound of the random delay added before the first background sweep
    pub jitter: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            qualifying_statuses: vec![
                "selected".to_string(),
                "interview_selected".to_string(),
                "placed".to_string(),
            ],
            scan_limit: 200,
            archive_reason: "end_date_passed_no_candidates".to_string(),
            archived_status: JobStatus::DemandClosed,
            expiry_action: ExpiryAction::Archive,
            serialize_sweeps: false,
            interval: Duration::from_secs(3600),
            jitter: Duration::ZERO,
        }
    }
}
