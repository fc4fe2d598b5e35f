//! PostgreSQL-backed user store (`users` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::UserStore;
use crate::auth::AuthError;
use crate::models::auth::{User, UserWithPassword};

type UserRow = (Uuid, String, bool, DateTime<Utc>, DateTime<Utc>);

fn user_from_row((id, email, is_chirpy_red, created_at, updated_at): UserRow) -> User {
    User {
        id,
        email,
        is_chirpy_red,
        created_at,
        updated_at,
    }
}

/// Map a unique-constraint violation on `email` to `Conflict`.
fn conflict_on_duplicate(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::Conflict("Email already registered".into())
        }
        _ => AuthError::Storage(e),
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
             RETURNING id, email, is_chirpy_red, created_at, updated_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_duplicate)?;
        Ok(user_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let row = sqlx::query_as::<_, (Uuid, String, bool, DateTime<Utc>, DateTime<Utc>, String)>(
            "SELECT id, email, is_chirpy_red, created_at, updated_at, hashed_password \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(id, email, is_chirpy_red, created_at, updated_at, password_hash)| UserWithPassword {
                user: user_from_row((id, email, is_chirpy_red, created_at, updated_at)),
                password_hash,
            },
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, is_chirpy_red, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET email = $2, hashed_password = $3, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, email, is_chirpy_red, created_at, updated_at",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(conflict_on_duplicate)?;
        Ok(row.map(user_from_row))
    }

    async fn upgrade(&self, id: Uuid) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
