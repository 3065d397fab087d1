use crate::validation::FieldViolation;

/// Domain-level failures shared by every crate in the workspace.
///
/// Soft authentication failures (bad signature, expired access credential,
/// unknown refresh token) never become a `CoreError`; they degrade to an
/// absent identity and only surface as [`CoreError::Unauthenticated`] when a
/// route requires a user.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Route not found")]
    NotFound,

    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,
}
