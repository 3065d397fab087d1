//! Cookie-based session resolution and the authenticated-user extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use messenger_core::error::CoreError;
use messenger_core::types::DbId;
use messenger_db::models::user::User;

use crate::auth::cookies::{append_set_cookies, read_credentials, session_cookies};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What [`resolve_identity`] learned about the request, stored in its extensions.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub user: Option<User>,
    /// Refresh token id sent by the client.
    pub presented_refresh: Option<String>,
    /// Refresh token id minted by a rotation during this request.
    pub rotated_refresh: Option<String>,
}

impl SessionContext {
    /// The refresh token that identifies this session after any rotation.
    pub fn active_refresh(&self) -> Option<&str> {
        self.rotated_refresh
            .as_deref()
            .or(self.presented_refresh.as_deref())
    }
}

/// Resolve the `access`/`refresh` cookies into a [`SessionContext`].
///
/// When the refresh token was rotated, the new cookie pair is appended to the
/// response unless the handler already set cookies of its own (logout does).
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    if state.config.sweep_on_request {
        state.authority.sweep_expired().await;
    }

    let presented = read_credentials(request.headers());
    let resolution = state
        .authority
        .resolve(presented.access.as_deref(), presented.refresh.as_deref())
        .await?;

    request.extensions_mut().insert(SessionContext {
        user: resolution.user,
        presented_refresh: presented.refresh,
        rotated_refresh: resolution
            .rotated
            .as_ref()
            .map(|session| session.refresh_token.clone()),
    });

    let mut response = next.run(request).await;

    if let Some(session) = resolution.rotated {
        if !response.headers().contains_key(SET_COOKIE) {
            let cookies = session_cookies(&session, &state.config.jwt, &state.config.cookies);
            append_set_cookies(response.headers_mut(), cookies)
                .map_err(|e| AppError::InternalError(format!("Invalid cookie value: {e}")))?;
        }
    }

    Ok(response)
}

/// The authenticated user for this request.
///
/// Use this as an extractor parameter in any handler behind
/// [`resolve_identity`] that requires a user; without one the request is
/// rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
    /// Refresh token id of the current session, if the client has one.
    pub refresh_token: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<SessionContext>()
            .ok_or(AppError::Core(CoreError::Unauthenticated))?;

        let user = context
            .user
            .as_ref()
            .ok_or(AppError::Core(CoreError::Unauthenticated))?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username.clone(),
            refresh_token: context.active_refresh().map(str::to_string),
        })
    }
}
