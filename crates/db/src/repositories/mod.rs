//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod refresh_token_repo;
pub mod user_repo;

pub use refresh_token_repo::RefreshTokenRepo;
pub use user_repo::UserRepo;
