use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::validation::ErrorResponse;
use crate::db::store::StoreError;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested document not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Store(e) if e.is_systemic() => {
                error!("Store unavailable: {}", e);
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "Service unavailable".to_string(),
                    fields: serde_json::json!({"message": "Database unavailable"}),
                })
            }
            ServiceError::Store(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::NotFound { kind, id } => {
                warn!("{} not found: {}", kind, id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("{} {} not found", kind, id)}),
                })
            }
        }
    }
}
