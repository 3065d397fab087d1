use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use messenger_core::error::CoreError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the fixed JSON error bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `messenger_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message. Never shown to clients.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn status_body(status: StatusCode) -> Value {
    json!({ "status": status.as_u16() })
}

fn internal() -> (StatusCode, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "500: Internal Server Error" }),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound => (
                    StatusCode::NOT_FOUND,
                    json!({ "error": "404: Not Found" }),
                ),
                CoreError::Validation(violations) => {
                    (StatusCode::BAD_REQUEST, json!({ "errors": violations }))
                }
                CoreError::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    status_body(StatusCode::BAD_REQUEST),
                ),
                CoreError::Unauthenticated => (
                    StatusCode::UNAUTHORIZED,
                    status_body(StatusCode::UNAUTHORIZED),
                ),
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status and body.
///
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized body.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, Value) {
    if let sqlx::Error::Database(db_err) = err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                tracing::info!(constraint, "Unique constraint violated");
                return (StatusCode::CONFLICT, status_body(StatusCode::CONFLICT));
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    internal()
}
