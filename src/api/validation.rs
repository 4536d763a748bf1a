use actix_web::{error::InternalError, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::ValidationErrors;

/// JSON body of every error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: Value,
}

fn bad_request(error: &str, fields: Map<String, Value>) -> actix_web::Error {
    InternalError::from_response(
        "",
        HttpResponse::BadRequest().json(ErrorResponse {
            error: error.to_string(),
            fields: Value::Object(fields),
        }),
    )
    .into()
}

/// Per-field validation messages, `{"field": {"errors": [..]}}`
pub fn field_errors(errors: &ValidationErrors) -> Map<String, Value> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation error in field: {}", field))
                })
                .collect();
            (field.to_string(), json!({ "errors": messages }))
        })
        .collect()
}

fn deserialize_message(text: &str) -> &'static str {
    if text.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if text.contains("missing field") {
        "Required field is missing"
    } else if text.contains("unknown variant") || text.contains("invalid type") {
        "Invalid value. Check allowed values for this field"
    } else {
        "Invalid JSON format"
    }
}

/// JsonConfig shared by every JSON endpoint
///
/// Validation and deserialization failures become a 400 with an `ErrorResponse`
/// listing the offending fields.
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            bad_request("Validation failed", field_errors(&validation_errors))
        }
        actix_web_validator::Error::Deserialize(de_err) => {
            let mut fields = Map::new();
            fields.insert(
                "message".to_string(),
                json!(deserialize_message(&de_err.to_string())),
            );
            bad_request("Request validation failed", fields)
        }
        _ => {
            let mut fields = Map::new();
            fields.insert("message".to_string(), json!("Validation error"));
            bad_request("Validation failed", fields)
        }
    })
}
