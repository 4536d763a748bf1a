use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `PUT /candidates/{candidate_id}/status`
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct StatusUpdate {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Status must be between 1 and 64 characters"
    ))]
    pub status: String,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    /// User recorded as `last_updated_by` and in the application history
    #[validate(length(min = 1, max = 64, message = "updated_by must be between 1 and 64 characters"))]
    pub updated_by: Option<String>,
}

/// Response for a candidate status change
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub candidate_id: String,
    pub old_status: String,
    pub new_status: String,
}
