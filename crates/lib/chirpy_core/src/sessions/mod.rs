//! Refresh session storage.
//!
//! A refresh session is an opaque random token bound to a user, with an
//! expiry and a revocation marker. Storage is the only source of truth for
//! session liveness: nothing here caches validity, so a revoked session is
//! rejected on the very next lookup.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::AuthError;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

/// Expiry instant for a session created at `now`, or `InvalidTtl` when
/// `now + ttl` falls outside the representable range.
pub(crate) fn session_expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::InvalidTtl(format!("refresh session ttl {ttl} overflows")))
}

/// Persistence for refresh sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for `user_id` expiring after `ttl`, returning the raw
    /// token. The raw value is returned exactly once and is not recoverable
    /// from storage afterwards.
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError>;

    /// Resolve a raw token to its owner.
    ///
    /// Fails with `UnknownSession`, `ExpiredSession` or `RevokedSession`.
    async fn resolve_session(&self, token: &str) -> Result<Uuid, AuthError>;

    /// Revoke the session identified by `token` if it belongs to `user_id`.
    ///
    /// Revoking an already revoked session succeeds and keeps the original
    /// revocation time. Fails with `UnknownSession` or `SessionOwnership`.
    async fn revoke_session(&self, token: &str, user_id: Uuid) -> Result<(), AuthError>;

    /// Revoke every live session of `user_id`, returning how many changed.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError>;

    /// Delete sessions past their expiry, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, AuthError>;

    /// Delete every session regardless of state.
    async fn delete_all(&self) -> Result<u64, AuthError>;
}
