//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code and JSON body. They do NOT need an HTTP server -- they call
//! `IntoResponse` directly on `AppError` values.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use messenger_api::error::AppError;
use messenger_core::error::CoreError;
use messenger_core::validation::FieldViolation;
use serde_json::json;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn unauthenticated_returns_bare_401() {
    let (status, json) = error_to_response(CoreError::Unauthenticated.into()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({ "status": 401 }));
}

#[tokio::test]
async fn invalid_credentials_returns_bare_400() {
    let (status, json) = error_to_response(CoreError::InvalidCredentials.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "status": 400 }));
}

#[tokio::test]
async fn validation_error_lists_violations() {
    let err = CoreError::Validation(vec![
        FieldViolation::new("username", "Username already exists."),
        FieldViolation::new("displayName", "Display name already exists."),
    ]);

    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "username");
    assert_eq!(json["errors"][1]["message"], "Display name already exists.");
}

#[tokio::test]
async fn not_found_returns_404_body() {
    let (status, json) = error_to_response(CoreError::NotFound.into()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "error": "404: Not Found" }));
}

#[tokio::test]
async fn database_error_does_not_leak_details() {
    let err = AppError::Database(sqlx::Error::Protocol("secret connection string".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "500: Internal Server Error" }));
}

#[tokio::test]
async fn internal_error_hides_its_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("signing failed".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "500: Internal Server Error" }));
}
