//! Access-credential (JWT) generation/verification and refresh-token helpers.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload and
//! are never stored. Refresh tokens are opaque random strings whose value is
//! the primary key of their `refresh_tokens` row.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use messenger_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Configuration for access and refresh credential lifetimes and signing.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify access tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 30;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration through `lookup` (normally `std::env::var`).
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `30`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must not be empty".into(),
            });
        }

        let access_token_expiry_mins =
            parse_positive(&lookup, "JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS)?;
        let refresh_token_expiry_days =
            parse_positive(&lookup, "JWT_REFRESH_EXPIRY_DAYS", DEFAULT_REFRESH_EXPIRY_DAYS)?;

        Ok(Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        })
    }

    /// Access token lifetime in seconds, used for the cookie `Max-Age`.
    pub fn access_max_age_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Refresh token lifetime in seconds, used for the cookie `Max-Age`.
    pub fn refresh_max_age_secs(&self) -> i64 {
        self.refresh_token_expiry_days * 86_400
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}

/// Why a presented access token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not a well-formed JWT (bad segments, base64, JSON or claims).
    Malformed,
    /// Signature or algorithm does not match our key.
    BadSignature,
    /// Past its `exp` (or before its `nbf`).
    Expired,
}

/// Outcome of checking an access token that did not hit a hard error.
#[derive(Debug, Clone)]
pub enum AccessVerdict {
    Valid(Claims),
    Rejected(RejectReason),
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_max_age_secs();

    let claims = Claims {
        sub: user_id,
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    // HS256, validates exp with no clock tolerance.
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Verify an access token, separating soft rejections from hard failures.
///
/// Tampered, malformed and expired tokens come back as
/// [`AccessVerdict::Rejected`]. Only failures that point at our own key or
/// crypto setup are returned as `Err` and must fail the request.
pub fn verify_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<AccessVerdict, jsonwebtoken::errors::Error> {
    match validate_token(token, config) {
        Ok(claims) => Ok(AccessVerdict::Valid(claims)),
        Err(err) => match classify(err.kind()) {
            Some(reason) => Ok(AccessVerdict::Rejected(reason)),
            None => Err(err),
        },
    }
}

fn classify(kind: &ErrorKind) -> Option<RejectReason> {
    match kind {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidSubject
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience => Some(RejectReason::Malformed),
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            Some(RejectReason::BadSignature)
        }
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => Some(RejectReason::Expired),
        _ => None,
    }
}

/// Generate a refresh token value (UUID v4, 122 random bits).
pub fn generate_refresh_token() -> String {
    Uuid::new_v4().to_string()
}
