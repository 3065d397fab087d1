//! Route definitions for registration, login and revocation.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes that create a session and therefore need no existing one.
///
/// ```text
/// POST /register -> register
/// POST /login    -> login
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Routes that require a resolved session.
///
/// ```text
/// DELETE /tokens -> delete_tokens (all sessions)
/// DELETE /logout -> logout        (current session)
/// ```
pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/tokens", delete(auth::delete_tokens))
        .route("/logout", delete(auth::logout))
}
