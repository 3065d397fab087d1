use crate::auth::cookies::CookieConfig;
use crate::auth::jwt::JwtConfig;

/// A configuration value that is missing or cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Server configuration loaded from environment variables.
///
/// Built once at startup and handed to the session authority and the router;
/// nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How often the expired-token sweep runs, in seconds (default: `3600`).
    pub token_sweep_interval_secs: u64,
    /// Also sweep expired tokens before resolving each request (default: `false`).
    pub sweep_on_request: bool,
    /// JWT signing secret and credential lifetimes.
    pub jwt: JwtConfig,
    /// Attributes applied to the `refresh` and `access` cookies.
    pub cookies: CookieConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `TOKEN_SWEEP_INTERVAL_SECS` | `3600`                     |
    /// | `SWEEP_ON_REQUEST`          | `false`                    |
    /// | `COOKIE_SECURE`             | `true`                     |
    ///
    /// See [`JwtConfig::from_lookup`] for the `JWT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let token_sweep_interval_secs = parse_or(&lookup, "TOKEN_SWEEP_INTERVAL_SECS", 3600u64)?;
        if token_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_SWEEP_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }
        let sweep_on_request = parse_or(&lookup, "SWEEP_ON_REQUEST", false)?;

        let jwt = JwtConfig::from_lookup(&lookup)?;
        let cookies = CookieConfig {
            secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            token_sweep_interval_secs,
            sweep_on_request,
            jwt,
            cookies,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("could not parse '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.token_sweep_interval_secs, 3600);
        assert!(!config.sweep_on_request);
        assert!(config.cookies.secure);
        assert_eq!(config.jwt.access_token_expiry_mins, 30);
        assert_eq!(config.jwt.refresh_token_expiry_days, 7);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn bad_port_is_an_error() {
        assert_matches!(
            load(&[("JWT_SECRET", "s3cret"), ("PORT", "http")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        );
    }

    #[test]
    fn flags_parse_as_booleans() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("SWEEP_ON_REQUEST", "true"),
            ("COOKIE_SECURE", "false"),
        ])
        .unwrap();
        assert!(config.sweep_on_request);
        assert!(!config.cookies.secure);
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        assert_matches!(
            load(&[("JWT_SECRET", "s3cret"), ("TOKEN_SWEEP_INTERVAL_SECS", "0")]),
            Err(ConfigError::Invalid { key: "TOKEN_SWEEP_INTERVAL_SECS", .. })
        );
    }
}
