//! Encoding and decoding of the `refresh` and `access` session cookies.
//!
//! Both cookies are always written together and in the same order: `refresh`
//! first, then `access`. The headers are appended by hand rather than through
//! a cookie jar so that order is stable.

use axum::http::header::{InvalidHeaderValue, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::{Cookie, SameSite};

use crate::auth::authority::IssuedSession;
use crate::auth::jwt::JwtConfig;

/// Cookie carrying the refresh token id.
pub const REFRESH_COOKIE: &str = "refresh";
/// Cookie carrying the signed access token.
pub const ACCESS_COOKIE: &str = "access";

/// Attributes shared by both session cookies.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Emit the `Secure` attribute. Only disable for plain-HTTP local setups.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self { secure: true }
    }
}

/// Credentials found on an incoming request. Empty cookie values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedCredentials {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

fn build(name: &'static str, value: String, max_age_secs: i64, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// The `[refresh, access]` cookie pair for a freshly issued session.
pub fn session_cookies(
    session: &IssuedSession,
    jwt: &JwtConfig,
    config: &CookieConfig,
) -> [Cookie<'static>; 2] {
    [
        build(
            REFRESH_COOKIE,
            session.refresh_token.clone(),
            jwt.refresh_max_age_secs(),
            config,
        ),
        build(
            ACCESS_COOKIE,
            session.access_token.clone(),
            jwt.access_max_age_secs(),
            config,
        ),
    ]
}

/// The `[refresh, access]` pair that makes the client drop both cookies.
pub fn clearing_cookies(config: &CookieConfig) -> [Cookie<'static>; 2] {
    [
        build(REFRESH_COOKIE, String::new(), 0, config),
        build(ACCESS_COOKIE, String::new(), 0, config),
    ]
}

/// Append one `Set-Cookie` header per cookie, preserving the given order.
pub fn append_set_cookies(
    headers: &mut HeaderMap,
    cookies: [Cookie<'static>; 2],
) -> Result<(), InvalidHeaderValue> {
    for cookie in cookies {
        headers.append(SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    }
    Ok(())
}

/// Pull the session credentials out of every `Cookie` header on the request.
///
/// Unparseable pairs are skipped. The first non-empty value of each cookie wins.
pub fn read_credentials(headers: &HeaderMap) -> PresentedCredentials {
    let mut presented = PresentedCredentials::default();

    let values = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok());

    for value in values {
        for cookie in Cookie::split_parse(value).filter_map(Result::ok) {
            if cookie.value().is_empty() {
                continue;
            }
            let slot = match cookie.name() {
                REFRESH_COOKIE => &mut presented.refresh,
                ACCESS_COOKIE => &mut presented.access,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(cookie.value().to_string());
            }
        }
    }

    presented
}
