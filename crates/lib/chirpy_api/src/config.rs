//! API server configuration.
//!
//! Values arrive already parsed from the command line / environment (see the
//! server binary); this module range-checks them and assembles `ApiConfig`.

use std::time::Duration;

use chirpy_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, load_or_create_jwt_secret};
use chirpy_core::auth::refresh::REFRESH_TOKEN_EXPIRY_DAYS;
use chrono::TimeDelta;
use secrecy::SecretString;
use thiserror::Error;

/// Longest accepted access token lifetime: one day.
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted refresh session lifetime: one year.
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

/// Longest accepted per-request deadline: five minutes.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 5 * 60;

/// Startup configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        max: i64,
    },
}

/// Deployment flavour; `Dev` unlocks destructive admin endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Dev,
    Prod,
}

impl Platform {
    /// Anything other than `dev` is treated as production.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("dev") {
            Platform::Dev
        } else {
            Platform::Prod
        }
    }
}

/// Configuration for the API server.
///
/// Built once at startup and shared read-only through `AppState`. Secrets
/// are wrapped in `SecretString`, so `Debug` output never contains them.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: SecretString,
    /// Shared secret the payment provider presents on webhook calls.
    pub polka_key: SecretString,
    pub platform: Platform,
    /// Lifetime of issued access tokens.
    pub access_token_ttl: TimeDelta,
    /// Lifetime of refresh sessions.
    pub refresh_token_ttl: TimeDelta,
    /// Deadline for a whole request, storage calls included.
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Configuration for tests and local tooling: fixed secrets, dev platform.
    pub fn for_secrets(jwt_secret: &str, polka_key: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: String::new(),
            jwt_secret: SecretString::from(jwt_secret.to_string()),
            polka_key: SecretString::from(polka_key.to_string()),
            platform: Platform::Dev,
            access_token_ttl: TimeDelta::seconds(ACCESS_TOKEN_EXPIRY_SECS),
            refresh_token_ttl: TimeDelta::days(REFRESH_TOKEN_EXPIRY_DAYS),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Use the explicit secret when one is given, else the persisted one
/// (generated on first use).
pub fn resolve_jwt_secret(explicit: Option<String>) -> SecretString {
    match explicit.filter(|s| !s.is_empty()) {
        Some(secret) => SecretString::from(secret),
        None => SecretString::from(load_or_create_jwt_secret()),
    }
}

fn check_range(name: &'static str, value: i64, max: i64) -> Result<i64, ConfigError> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value, max })
    }
}

/// Access token lifetime from seconds, 1 to [`MAX_ACCESS_TOKEN_TTL_SECS`].
pub fn access_token_ttl_from_secs(secs: i64) -> Result<TimeDelta, ConfigError> {
    let secs = check_range("access token ttl (secs)", secs, MAX_ACCESS_TOKEN_TTL_SECS)?;
    Ok(TimeDelta::seconds(secs))
}

/// Refresh session lifetime from days, 1 to [`MAX_REFRESH_TOKEN_TTL_DAYS`].
pub fn refresh_token_ttl_from_days(days: i64) -> Result<TimeDelta, ConfigError> {
    let days = check_range("refresh token ttl (days)", days, MAX_REFRESH_TOKEN_TTL_DAYS)?;
    Ok(TimeDelta::days(days))
}

/// Per-request deadline from seconds, 1 to [`MAX_REQUEST_TIMEOUT_SECS`].
pub fn request_timeout_from_secs(secs: u64) -> Result<Duration, ConfigError> {
    let value = i64::try_from(secs).unwrap_or(i64::MAX);
    check_range(
        "request timeout (secs)",
        value,
        MAX_REQUEST_TIMEOUT_SECS as i64,
    )?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parse_defaults_to_prod() {
        assert_eq!(Platform::parse("dev"), Platform::Dev);
        assert_eq!(Platform::parse("DEV"), Platform::Dev);
        assert_eq!(Platform::parse(""), Platform::Prod);
        assert_eq!(Platform::parse("staging"), Platform::Prod);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = ApiConfig::for_secrets("jwt-signing-value", "polka-shared-value");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("jwt-signing-value"));
        assert!(!rendered.contains("polka-shared-value"));
    }

    #[test]
    fn default_lifetimes_are_accepted() {
        assert_eq!(
            access_token_ttl_from_secs(ACCESS_TOKEN_EXPIRY_SECS).unwrap(),
            TimeDelta::hours(1)
        );
        assert_eq!(
            refresh_token_ttl_from_days(REFRESH_TOKEN_EXPIRY_DAYS).unwrap(),
            TimeDelta::days(60)
        );
        assert_eq!(request_timeout_from_secs(10).unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn non_positive_lifetimes_are_rejected() {
        for secs in [0, -1, -3600, i64::MIN] {
            assert!(access_token_ttl_from_secs(secs).is_err(), "{secs}");
        }
        for days in [0, -60] {
            assert!(refresh_token_ttl_from_days(days).is_err(), "{days}");
        }
        assert!(request_timeout_from_secs(0).is_err());
    }

    #[test]
    fn oversized_lifetimes_are_rejected_without_panicking() {
        assert!(access_token_ttl_from_secs(i64::MAX).is_err());
        assert!(access_token_ttl_from_secs(MAX_ACCESS_TOKEN_TTL_SECS + 1).is_err());
        assert_eq!(
            refresh_token_ttl_from_days(100_000_000),
            Err(ConfigError::OutOfRange {
                name: "refresh token ttl (days)",
                value: 100_000_000,
                max: MAX_REFRESH_TOKEN_TTL_DAYS,
            })
        );
        assert!(refresh_token_ttl_from_days(i64::MAX).is_err());
        assert!(request_timeout_from_secs(u64::MAX).is_err());
    }

    #[test]
    fn explicit_jwt_secret_wins() {
        use secrecy::ExposeSecret;
        let secret = resolve_jwt_secret(Some("from-env".into()));
        assert_eq!(secret.expose_secret(), "from-env");
    }
}
