//! Store seams consumed by the session authority.
//!
//! The authority holds these as trait objects so the HTTP layer never names
//! a concrete database. [`PgStore`] delegates to the repositories; with the
//! `test-util` feature, [`memory::MemoryStore`] provides an in-process
//! implementation for tests.

use async_trait::async_trait;
use messenger_core::types::{DbId, Timestamp};

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, User};
use crate::repositories::{RefreshTokenRepo, UserRepo};
use crate::DbPool;

#[cfg(feature = "test-util")]
pub mod memory;

/// User lookups and registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    async fn display_name_exists(&self, display_name: &str) -> Result<bool, sqlx::Error>;

    /// Create the user and its profile atomically.
    async fn create_with_profile(&self, input: &CreateUser) -> Result<User, sqlx::Error>;
}

/// Persisted refresh tokens, the source of truth for live sessions.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(&self, input: &CreateRefreshToken) -> Result<RefreshToken, sqlx::Error>;

    /// Atomically delete and return the token if it is valid at `now`.
    async fn consume(&self, id: &str, now: Timestamp)
        -> Result<Option<RefreshToken>, sqlx::Error>;

    /// Delete one token, only if `user_id` owns it.
    async fn delete(&self, id: &str, user_id: DbId) -> Result<bool, sqlx::Error>;

    async fn delete_all_for_user(&self, user_id: DbId) -> Result<u64, sqlx::Error>;

    /// Remove tokens with `expires <= now`, returning how many were deleted.
    async fn delete_expired(&self, now: Timestamp) -> Result<u64, sqlx::Error>;
}

/// Postgres-backed implementation of both store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_id(&self.pool, id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_username(&self.pool, username).await
    }

    async fn display_name_exists(&self, display_name: &str) -> Result<bool, sqlx::Error> {
        UserRepo::display_name_exists(&self.pool, display_name).await
    }

    async fn create_with_profile(&self, input: &CreateUser) -> Result<User, sqlx::Error> {
        UserRepo::create_with_profile(&self.pool, input).await
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create(&self, input: &CreateRefreshToken) -> Result<RefreshToken, sqlx::Error> {
        RefreshTokenRepo::create(&self.pool, input).await
    }

    async fn consume(
        &self,
        id: &str,
        now: Timestamp,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        RefreshTokenRepo::consume(&self.pool, id, now).await
    }

    async fn delete(&self, id: &str, user_id: DbId) -> Result<bool, sqlx::Error> {
        RefreshTokenRepo::delete(&self.pool, id, user_id).await
    }

    async fn delete_all_for_user(&self, user_id: DbId) -> Result<u64, sqlx::Error> {
        RefreshTokenRepo::delete_all_for_user(&self.pool, user_id).await
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, sqlx::Error> {
        RefreshTokenRepo::delete_expired(&self.pool, now).await
    }
}
