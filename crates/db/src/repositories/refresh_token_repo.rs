//! Repository for the `refresh_tokens` table.
//!
//! Every mutation is a single statement, so concurrent rotations of the same
//! token are arbitrated by the database: at most one `consume` returns a row.

use messenger_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, expires, created_at";

/// Provides CRUD operations for refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Insert a new refresh token, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (id, user_id, expires)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(&input.id)
            .bind(input.user_id)
            .bind(input.expires)
            .fetch_one(pool)
            .await
    }

    /// Delete the token if it is still valid at `now` and return the deleted row.
    ///
    /// `None` means the token was unknown, expired, or already consumed by a
    /// concurrent request.
    pub async fn consume(
        pool: &PgPool,
        id: &str,
        now: Timestamp,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "DELETE FROM refresh_tokens WHERE id = $1 AND expires > $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete a single token owned by `user_id`. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every token owned by a user. Returns the count of deleted rows.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete tokens whose expiry is at or before `now`. Returns the count.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count the tokens currently stored for a user, expired or not.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count.0)
    }
}
