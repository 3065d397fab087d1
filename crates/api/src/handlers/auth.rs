//! Handlers for registration, login and session revocation.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use messenger_core::error::CoreError;
use messenger_core::validation::{field_rank, FieldViolation, Registration};
use messenger_db::models::user::CreateUser;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::cookie::Cookie;

use crate::auth::authority::RevokeScope;
use crate::auth::cookies::{append_set_cookies, clearing_cookies, session_cookies};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /login`. Missing fields deserialize as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `{ "status": <code> }` with the given cookies appended in order.
fn status_with_cookies(status: StatusCode, cookies: [Cookie<'static>; 2]) -> AppResult<Response> {
    let mut response = (status, Json(json!({ "status": status.as_u16() }))).into_response();
    append_set_cookies(response.headers_mut(), cookies)
        .map_err(|e| AppError::InternalError(format!("Invalid cookie value: {e}")))?;
    Ok(response)
}

fn has_violation(violations: &[FieldViolation], field: &str) -> bool {
    violations.iter().any(|v| v.field == field)
}

/// POST /register
///
/// Validate the registration form, create the user and profile, and start a
/// session. All violations are reported together.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> AppResult<Response> {
    let input = payload
        .map(|Json(body)| body)
        .unwrap_or_default()
        .normalized();

    let mut violations = input.violations();

    if !has_violation(&violations, "username")
        && state.users.find_by_username(&input.username).await?.is_some()
    {
        violations.push(FieldViolation::new("username", "Username already exists."));
    }
    if !has_violation(&violations, "displayName")
        && state.users.display_name_exists(&input.display_name).await?
    {
        violations.push(FieldViolation::new(
            "displayName",
            "Display name already exists.",
        ));
    }

    if !violations.is_empty() {
        violations.sort_by_key(|v| field_rank(&v.field));
        return Err(CoreError::Validation(violations).into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = state
        .users
        .create_with_profile(&CreateUser {
            username: input.username,
            password_hash,
            display_name: input.display_name,
        })
        .await?;
    tracing::info!(user_id = user.id, "User registered");

    let session = state.authority.issue(&user).await?;
    status_with_cookies(
        StatusCode::CREATED,
        session_cookies(&session, &state.config.jwt, &state.config.cookies),
    )
}

/// POST /login
///
/// Check username and password and start a session. Missing fields and bad
/// credentials both produce a bare 400 with no cookies.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Response> {
    let input = payload.map(|Json(body)| body).unwrap_or_default();
    let username = input.username.trim();

    if username.is_empty() || input.password.is_empty() {
        return Err(CoreError::InvalidCredentials.into());
    }

    let user = state
        .users
        .find_by_username(username)
        .await?
        .ok_or(CoreError::InvalidCredentials)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(CoreError::InvalidCredentials.into());
    }

    let session = state.authority.issue(&user).await?;
    tracing::info!(user_id = user.id, "User logged in");

    status_with_cookies(
        StatusCode::OK,
        session_cookies(&session, &state.config.jwt, &state.config.cookies),
    )
}

/// DELETE /tokens
///
/// Revoke every session the user owns and clear the caller's cookies.
pub async fn delete_tokens(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    state
        .authority
        .revoke(user.user_id, RevokeScope::AllSessions)
        .await?;

    status_with_cookies(StatusCode::OK, clearing_cookies(&state.config.cookies))
}

/// DELETE /logout
///
/// Revoke the caller's current session and clear its cookies.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    state
        .authority
        .revoke(user.user_id, RevokeScope::SingleSession(user.refresh_token))
        .await?;

    status_with_cookies(StatusCode::OK, clearing_cookies(&state.config.cookies))
}

/// Fallback for authenticated requests to unknown routes.
pub async fn not_found(_user: AuthUser) -> AppError {
    CoreError::NotFound.into()
}

/// Known path, wrong method.
pub async fn method_not_allowed() -> Response {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    (status, Json(json!({ "status": status.as_u16() }))).into_response()
}
