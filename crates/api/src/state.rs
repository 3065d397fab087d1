use std::sync::Arc;

use messenger_db::store::{RefreshTokenStore, UserStore};

use crate::auth::authority::SessionAuthority;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Issues, resolves and revokes sessions.
    pub authority: Arc<SessionAuthority>,
    /// User lookups and registration.
    pub users: Arc<dyn UserStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let authority = SessionAuthority::new(Arc::clone(&users), tokens, config.jwt.clone());
        Self {
            authority: Arc::new(authority),
            users,
            config: Arc::new(config),
        }
    }
}
