use std::collections::BTreeMap;

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Absent and not-owned are reported the same way.
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed")]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Task is closed for submissions")]
    TaskClosed,

    #[error("No free alias found after {0} attempts")]
    AliasSpaceExhausted(usize),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_string(), vec![message.into()]);
        AppError::Validation(fields)
    }

    /// Maps a unique-constraint violation on user-supplied input to `Conflict`.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        if is_unique_violation(&err) {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// SQLITE_BUSY or SQLITE_LOCKED, including their extended codes.
pub fn is_busy_or_locked(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Login required".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Validation(errors) => {
                fields = Some(errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Please correct the highlighted fields".to_string(),
                )
            }
            AppError::TaskClosed => (
                StatusCode::CONFLICT,
                "This task no longer accepts submissions".to_string(),
            ),
            AppError::AliasSpaceExhausted(attempts) => {
                error!(attempts, "alias space exhausted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not generate unique student aliases".to_string(),
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Storage(e) => {
                error!("storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File storage error occurred".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
            fields,
        });

        (status, body).into_response()
    }
}
