//! JWT access token issuance and verification.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Issuer claim stamped on every access token.
pub const TOKEN_ISSUER: &str = "chirpy";

/// Default access token lifetime: 1 hour.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 60 * 60;

/// Signs and verifies HS256 access tokens with a single symmetric secret.
///
/// Built once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Generate a signed access token for `user_id` expiring after `ttl`.
    ///
    /// A negative `ttl` yields a token that is already expired.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InvalidTtl(format!("access token ttl {ttl} overflows")))?;
        let claims = TokenClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssue(format!("jwt encode: {e}")))
    }

    /// Verify an access token, returning the user it was issued to.
    ///
    /// Every failure (signature, expiry, issuer, shape, subject) is reported
    /// as `InvalidToken`; the cause only reaches the debug log.
    ///
    /// A token is live only while `now < exp`. jsonwebtoken still accepts
    /// `exp == now`, so expiry is re-checked here.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "access token rejected");
            AuthError::InvalidToken
        })?;
        if data.claims.exp <= Utc::now().timestamp() {
            debug!(exp = data.claims.exp, "access token expired");
            return Err(AuthError::InvalidToken);
        }
        Uuid::parse_str(&data.claims.sub).map_err(|e| {
            debug!(error = %e, "access token subject is not a user id");
            AuthError::InvalidToken
        })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &TOKEN_ISSUER)
            .finish_non_exhaustive()
    }
}

/// Load the JWT secret persisted in the user data directory, generating it
/// on first use.
pub fn load_or_create_jwt_secret() -> String {
    resolve_jwt_secret_at(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and writing a new one if
/// the file is missing or empty.
pub fn resolve_jwt_secret_at(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "could not persist JWT secret; tokens will not survive a restart"
        ),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chirpy")
        .join("jwt-secret")
}
