//! Refresh token model and DTOs.

use messenger_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `refresh_tokens` table.
///
/// `id` doubles as the credential stored in the client's `refresh` cookie.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: DbId,
    pub expires: Timestamp,
    pub created_at: Timestamp,
}

impl RefreshToken {
    /// A token is usable strictly before its expiry instant.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expires
    }
}

/// DTO for inserting a new refresh token.
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub id: String,
    pub user_id: DbId,
    pub expires: Timestamp,
}
