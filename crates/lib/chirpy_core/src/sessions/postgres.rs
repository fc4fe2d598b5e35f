//! PostgreSQL-backed session store (`refresh_tokens` table).

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{SessionStore, session_expiry};
use crate::auth::AuthError;
use crate::auth::refresh::{generate_refresh_token, hash_refresh_token};
use crate::uuid::uuidv7;

/// Default upper bound on a single session query.
const DEFAULT_STATEMENT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Session store over a PostgreSQL pool.
///
/// Every mutation is a single statement, so dropping a call midway (request
/// cancelled or timed out) never leaves a half-written session.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
    statement_timeout: std::time::Duration,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Override the per-statement deadline.
    pub fn with_statement_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => {
                warn!(op, timeout = ?self.statement_timeout, "session query timed out");
                Err(AuthError::StorageTimeout)
            }
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let token = generate_refresh_token();
        let token_hash = hash_refresh_token(&token);
        let expires_at = session_expiry(Utc::now(), ttl)?;

        self.bounded(
            "create_session",
            sqlx::query(
                "INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(uuidv7())
            .bind(&token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_hash = hash_refresh_token(token);
        let row = self
            .bounded(
                "resolve_session",
                sqlx::query_as::<_, (Uuid, DateTime<Utc>, Option<DateTime<Utc>>)>(
                    "SELECT user_id, expires_at, revoked_at \
                     FROM refresh_tokens \
                     WHERE token_hash = $1",
                )
                .bind(&token_hash)
                .fetch_optional(&self.pool),
            )
            .await?;

        let (user_id, expires_at, revoked_at) = row.ok_or(AuthError::UnknownSession)?;
        if expires_at <= Utc::now() {
            return Err(AuthError::ExpiredSession);
        }
        if revoked_at.is_some() {
            return Err(AuthError::RevokedSession);
        }
        Ok(user_id)
    }

    async fn revoke_session(&self, token: &str, user_id: Uuid) -> Result<(), AuthError> {
        let token_hash = hash_refresh_token(token);
        let revoked = self
            .bounded(
                "revoke_session",
                sqlx::query_scalar::<_, Uuid>(
                    "UPDATE refresh_tokens \
                     SET revoked_at = COALESCE(revoked_at, now()) \
                     WHERE token_hash = $1 AND user_id = $2 \
                     RETURNING id",
                )
                .bind(&token_hash)
                .bind(user_id)
                .fetch_optional(&self.pool),
            )
            .await?;
        if revoked.is_some() {
            return Ok(());
        }

        // Nothing matched: tell a missing token apart from someone else's.
        let exists = self
            .bounded(
                "revoke_session_lookup",
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM refresh_tokens WHERE token_hash = $1)",
                )
                .bind(&token_hash)
                .fetch_one(&self.pool),
            )
            .await?;
        if exists {
            Err(AuthError::SessionOwnership)
        } else {
            Err(AuthError::UnknownSession)
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let result = self
            .bounded(
                "revoke_all_for_user",
                sqlx::query(
                    "UPDATE refresh_tokens SET revoked_at = now() \
                     WHERE user_id = $1 AND revoked_at IS NULL",
                )
                .bind(user_id)
                .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> Result<u64, AuthError> {
        let result = self
            .bounded(
                "purge_expired",
                sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= now()")
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let result = self
            .bounded(
                "delete_all",
                sqlx::query("DELETE FROM refresh_tokens").execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }
}
