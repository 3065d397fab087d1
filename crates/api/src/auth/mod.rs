//! Authentication primitives and the session authority.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token signing/verification and refresh-token generation.
//! - [`cookies`] -- the `refresh`/`access` cookie pair.
//! - [`authority`] -- issues, resolves, rotates and revokes sessions.

pub mod authority;
pub mod cookies;
pub mod jwt;
pub mod password;
