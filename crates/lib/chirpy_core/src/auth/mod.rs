//! Authentication and session logic.
//!
//! Provides password hashing, JWT management and refresh-token generation
//! that the `chirpy_api` guards and handlers build on.

pub mod jwt;
pub mod password;
pub mod refresh;

use thiserror::Error;

/// Authentication errors.
///
/// Variants are kept distinct for logging; the HTTP layer collapses most of
/// them into a single generic "unauthorized" response.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Stored password digest is malformed: {0}")]
    MalformedDigest(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token issuance failed: {0}")]
    TokenIssue(String),

    #[error("Lifetime out of range: {0}")]
    InvalidTtl(String),

    #[error("Unknown refresh session")]
    UnknownSession,

    #[error("Refresh session expired")]
    ExpiredSession,

    #[error("Refresh session revoked")]
    RevokedSession,

    #[error("Refresh session belongs to another user")]
    SessionOwnership,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Storage call timed out")]
    StorageTimeout,
}

impl AuthError {
    /// Short machine-readable name of the failure kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Hashing(_) => "hashing",
            AuthError::PasswordMismatch => "password_mismatch",
            AuthError::MalformedDigest(_) => "malformed_digest",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenIssue(_) => "token_issue",
            AuthError::InvalidTtl(_) => "invalid_ttl",
            AuthError::UnknownSession => "unknown_session",
            AuthError::ExpiredSession => "expired_session",
            AuthError::RevokedSession => "revoked_session",
            AuthError::SessionOwnership => "session_ownership",
            AuthError::Conflict(_) => "conflict",
            AuthError::Storage(_) => "storage",
            AuthError::StorageTimeout => "storage_timeout",
        }
    }

    /// Whether this error originates from the storage layer rather than
    /// from the presented credential.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, AuthError::Storage(_) | AuthError::StorageTimeout)
    }
}
