//! User account storage.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::auth::{User, UserWithPassword};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Persistence for user accounts and their password hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Replace a user's email and password hash. Returns `None` when no such
    /// user exists.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AuthError>;

    /// Mark a user as upgraded. Returns `false` when no such user exists.
    async fn upgrade(&self, id: Uuid) -> Result<bool, AuthError>;

    /// Delete every user (and, through the schema, their sessions).
    async fn delete_all(&self) -> Result<u64, AuthError>;
}
