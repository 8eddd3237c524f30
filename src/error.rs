use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::leetcode::LeetCodeError;

/// Request-level failure taxonomy. Every handler converts into this type;
/// nothing here ever panics the process.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    LeetCode(#[from] LeetCodeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "errors": errors })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                envelope(StatusCode::BAD_REQUEST, &message)
            }
            ApiError::Unauthorized(message) => {
                envelope(StatusCode::UNAUTHORIZED, &message)
            }
            ApiError::Auth(err) => {
                let status = match err {
                    AuthError::HashFailure | AuthError::TokenCreation => {
                        error!("Auth failure: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    _ => StatusCode::UNAUTHORIZED,
                };
                envelope(status, &err.to_string())
            }
            ApiError::NotFound(what) => {
                envelope(StatusCode::NOT_FOUND, &format!("{} not found", what))
            }
            ApiError::Database(err) => {
                // Store failures are logged with detail; the caller sees a
                // generic message only.
                error!("Database error: {}", err);
                envelope(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ApiError::LeetCode(err) => match err {
                LeetCodeError::InvalidUsername(message) => {
                    envelope(StatusCode::BAD_REQUEST, &message)
                }
                LeetCodeError::Unavailable(_) => {
                    error!("LeetCode sync error: {}", err);
                    envelope(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to sync with LeetCode",
                    )
                }
            },
        }
    }
}

fn envelope(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Flatten validator's per-field errors into the message list the API
/// returns for 400s.
pub fn validation_messages(errors: ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|field_errors| {
            field_errors.iter().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
        })
        .collect();
    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
        #[validate(email(message = "Please enter a valid email"))]
        email: String,
    }

    #[test]
    fn validation_messages_are_field_level() {
        let probe = Probe {
            password: "abc".into(),
            email: "not-an-email".into(),
        };
        let messages = validation_messages(probe.validate().unwrap_err());
        assert_eq!(
            messages,
            vec![
                "Password must be at least 6 characters".to_string(),
                "Please enter a valid email".to_string(),
            ]
        );
    }
}
