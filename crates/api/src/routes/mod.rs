//! Route tree.
//!
//! ```text
//! GET    /health     -> health::health_check        (public)
//! POST   /register   -> auth::register              (public)
//! POST   /login      -> auth::login                 (public)
//! DELETE /tokens     -> auth::delete_tokens         (session)
//! DELETE /logout     -> auth::logout                (session)
//! *                  -> auth::not_found             (session)
//! ```
//!
//! A known path hit with the wrong method answers 405 `{status:405}`.
//!
//! Routes marked "session" run behind [`resolve_identity`], so a rotated
//! refresh token is applied before the handler sees the request.

pub mod auth;
pub mod health;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::handlers;
use crate::middleware::auth::resolve_identity;
use crate::state::AppState;

/// Build the full route tree for the given state.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .merge(health::router())
        .merge(auth::public_router())
        .method_not_allowed_fallback(handlers::auth::method_not_allowed);

    let session_routes = auth::session_router()
        .method_not_allowed_fallback(handlers::auth::method_not_allowed)
        .fallback(handlers::auth::not_found)
        .layer(from_fn_with_state(state.clone(), resolve_identity));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .with_state(state)
}
