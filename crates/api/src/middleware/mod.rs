//! Request middleware and extractors.
//!
//! - [`auth::resolve_identity`] -- resolves the session cookies on every
//!   request behind it and applies rotation cookies to the response.
//! - [`auth::AuthUser`] -- rejects with 401 when no user was resolved.

pub mod auth;
