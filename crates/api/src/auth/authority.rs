//! The session authority: issues, resolves, rotates and revokes sessions.
//!
//! A session is a pair of credentials bound to one user: a short-lived signed
//! access token that is never stored, and a long-lived refresh token whose
//! `refresh_tokens` row is the source of truth. Refresh tokens are single-use;
//! presenting one consumes its row and mints a fresh pair.

use std::sync::Arc;

use chrono::Utc;
use messenger_core::types::DbId;
use messenger_db::models::refresh_token::CreateRefreshToken;
use messenger_db::models::user::User;
use messenger_db::store::{RefreshTokenStore, UserStore};

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, verify_access_token, AccessVerdict, JwtConfig,
};
use crate::error::{AppError, AppResult};

/// A credential pair minted for a user. Values are sent as cookies and never logged.
#[derive(Clone)]
pub struct IssuedSession {
    pub user_id: DbId,
    pub refresh_token: String,
    pub access_token: String,
}

impl std::fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSession")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving the credentials presented on a request.
#[derive(Debug, Default)]
pub struct Resolution {
    /// The authenticated user, if any credential checked out.
    pub user: Option<User>,
    /// Set when a refresh token was consumed and a new pair issued.
    pub rotated: Option<IssuedSession>,
}

impl Resolution {
    fn anonymous() -> Self {
        Self::default()
    }
}

/// Which of a user's sessions to revoke.
#[derive(Debug, Clone)]
pub enum RevokeScope {
    /// Only the session identified by this refresh token id, if one was
    /// presented and it belongs to the revoking user.
    SingleSession(Option<String>),
    /// Every session the user owns.
    AllSessions,
}

pub struct SessionAuthority {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    jwt: JwtConfig,
}

impl SessionAuthority {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        jwt: JwtConfig,
    ) -> Self {
        Self { users, tokens, jwt }
    }

    /// Work out who is making the request.
    ///
    /// A valid access token wins outright. Otherwise a refresh token is
    /// atomically consumed and, if that succeeds, rotated into a new pair.
    /// Bad, expired or unknown credentials resolve to no user; only store
    /// failures and signing-key problems are errors.
    pub async fn resolve(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> AppResult<Resolution> {
        if let Some(token) = access {
            let verdict = verify_access_token(token, &self.jwt).map_err(|e| {
                AppError::InternalError(format!("Access token verification failed: {e}"))
            })?;

            match verdict {
                AccessVerdict::Valid(claims) => {
                    if let Some(user) = self.users.find_by_id(claims.sub).await? {
                        return Ok(Resolution {
                            user: Some(user),
                            rotated: None,
                        });
                    }
                    tracing::debug!(user_id = claims.sub, "Access token names an unknown user");
                }
                AccessVerdict::Rejected(reason) => {
                    tracing::debug!(?reason, "Access token rejected");
                }
            }
        }

        let Some(refresh) = refresh else {
            return Ok(Resolution::anonymous());
        };

        let Some(consumed) = self.tokens.consume(refresh, Utc::now()).await? else {
            tracing::debug!("Refresh token unknown or expired");
            return Ok(Resolution::anonymous());
        };

        let Some(user) = self.users.find_by_id(consumed.user_id).await? else {
            tracing::warn!(user_id = consumed.user_id, "Refresh token owner no longer exists");
            return Ok(Resolution::anonymous());
        };

        let session = self.issue(&user).await?;
        tracing::info!(user_id = user.id, "Refresh token rotated");

        Ok(Resolution {
            user: Some(user),
            rotated: Some(session),
        })
    }

    /// Mint a new credential pair and persist its refresh token.
    pub async fn issue(&self, user: &User) -> AppResult<IssuedSession> {
        let access_token = generate_access_token(user.id, &self.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

        let refresh_token = generate_refresh_token();
        let expires = Utc::now() + chrono::Duration::days(self.jwt.refresh_token_expiry_days);

        self.tokens
            .create(&CreateRefreshToken {
                id: refresh_token.clone(),
                user_id: user.id,
                expires,
            })
            .await?;

        tracing::debug!(user_id = user.id, "Session issued");

        Ok(IssuedSession {
            user_id: user.id,
            refresh_token,
            access_token,
        })
    }

    /// Delete refresh tokens according to `scope`, returning how many went.
    pub async fn revoke(&self, user_id: DbId, scope: RevokeScope) -> AppResult<u64> {
        let deleted = match scope {
            RevokeScope::SingleSession(Some(id)) => {
                u64::from(self.tokens.delete(&id, user_id).await?)
            }
            RevokeScope::SingleSession(None) => 0,
            RevokeScope::AllSessions => self.tokens.delete_all_for_user(user_id).await?,
        };

        tracing::info!(user_id, deleted, "Sessions revoked");
        Ok(deleted)
    }

    /// Delete every expired refresh token. Failures are logged and count as zero.
    pub async fn sweep_expired(&self) -> u64 {
        match self.tokens.delete_expired(Utc::now()).await {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::info!(deleted, "Expired refresh tokens swept");
                } else {
                    tracing::debug!("No expired refresh tokens to sweep");
                }
                deleted
            }
            Err(e) => {
                tracing::error!(error = %e, "Expired token sweep failed");
                0
            }
        }
    }
}
