//! In-memory session store, keyed by token hash.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{SessionStore, session_expiry};
use crate::auth::AuthError;
use crate::auth::refresh::{generate_refresh_token, hash_refresh_token};
use crate::models::auth::SessionRecord;
use crate::uuid::uuidv7;

/// Session store backed by a concurrent map. Used for tests and local runs
/// without a database; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, live or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let token = generate_refresh_token();
        let token_hash = hash_refresh_token(&token);
        let now = Utc::now();
        let expires_at = session_expiry(now, ttl)?;
        let record = SessionRecord {
            id: uuidv7(),
            token_hash: token_hash.clone(),
            user_id,
            created_at: now,
            expires_at,
            revoked_at: None,
        };
        self.sessions.insert(token_hash, record);
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<Uuid, AuthError> {
        let record = self
            .sessions
            .get(&hash_refresh_token(token))
            .ok_or(AuthError::UnknownSession)?;
        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::ExpiredSession);
        }
        if record.revoked_at.is_some() {
            return Err(AuthError::RevokedSession);
        }
        Ok(record.user_id)
    }

    async fn revoke_session(&self, token: &str, user_id: Uuid) -> Result<(), AuthError> {
        let mut record = self
            .sessions
            .get_mut(&hash_refresh_token(token))
            .ok_or(AuthError::UnknownSession)?;
        if record.user_id != user_id {
            return Err(AuthError::SessionOwnership);
        }
        if record.revoked_at.is_none() {
            record.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut count = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.user_id == user_id && entry.revoked_at.is_none() {
                entry.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired_at(now));
        Ok((before - self.sessions.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let count = self.sessions.len() as u64;
        self.sessions.clear();
        Ok(count)
    }
}
