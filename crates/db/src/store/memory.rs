//! In-process store used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use messenger_core::types::{DbId, Timestamp};

use super::{RefreshTokenStore, UserStore};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, User};

#[derive(Default)]
struct Tables {
    next_user_id: DbId,
    users: HashMap<DbId, User>,
    display_names: HashMap<DbId, String>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Mutex-guarded maps standing in for the `users`, `profiles` and
/// `refresh_tokens` tables.
///
/// [`MemoryStore::set_unavailable`] makes every call fail with
/// `sqlx::Error::PoolTimedOut`, which is how tests exercise store outages.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a token row directly, bypassing the authority.
    pub fn insert_token(&self, token: RefreshToken) {
        self.lock().refresh_tokens.insert(token.id.clone(), token);
    }

    pub fn token(&self, id: &str) -> Option<RefreshToken> {
        self.lock().refresh_tokens.get(id).cloned()
    }

    pub fn tokens_for_user(&self, user_id: DbId) -> Vec<RefreshToken> {
        self.lock()
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn token_count(&self) -> usize {
        self.lock().refresh_tokens.len()
    }

    /// Remove a user and cascade to their profile and tokens.
    pub fn remove_user(&self, user_id: DbId) {
        let mut tables = self.lock();
        tables.users.remove(&user_id);
        tables.display_names.remove(&user_id);
        tables.refresh_tokens.retain(|_, t| t.user_id != user_id);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn display_name_exists(&self, display_name: &str) -> Result<bool, sqlx::Error> {
        self.check()?;
        Ok(self
            .lock()
            .display_names
            .values()
            .any(|name| name == display_name))
    }

    async fn create_with_profile(&self, input: &CreateUser) -> Result<User, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.username == input.username)
            || tables.display_names.values().any(|n| *n == input.display_name)
        {
            return Err(sqlx::Error::Protocol("duplicate user".into()));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: input.username.clone(),
            password_hash: input.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        tables
            .display_names
            .insert(user.id, input.display_name.clone());
        Ok(user)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create(&self, input: &CreateRefreshToken) -> Result<RefreshToken, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        if tables.refresh_tokens.contains_key(&input.id) {
            return Err(sqlx::Error::Protocol("duplicate refresh token id".into()));
        }
        let token = RefreshToken {
            id: input.id.clone(),
            user_id: input.user_id,
            expires: input.expires,
            created_at: Utc::now(),
        };
        tables.refresh_tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn consume(
        &self,
        id: &str,
        now: Timestamp,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        match tables.refresh_tokens.get(id) {
            Some(token) if token.is_valid_at(now) => Ok(tables.refresh_tokens.remove(id)),
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: &str, user_id: DbId) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        match tables.refresh_tokens.get(id) {
            Some(token) if token.user_id == user_id => {
                Ok(tables.refresh_tokens.remove(id).is_some())
            }
            _ => Ok(false),
        }
    }

    async fn delete_all_for_user(&self, user_id: DbId) -> Result<u64, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, sqlx::Error> {
        self.check()?;
        let mut tables = self.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.is_valid_at(now));
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}
