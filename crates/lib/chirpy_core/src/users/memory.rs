//! In-memory user store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::UserStore;
use crate::auth::AuthError;
use crate::models::auth::{User, UserWithPassword};

/// User store backed by concurrent maps: accounts keyed by id, plus an
/// email index that doubles as the uniqueness constraint.
///
/// Lock order is always `emails` before `users`.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, UserWithPassword>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_conflict() -> AuthError {
    AuthError::Conflict("Email already registered".into())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        // The vacant entry stays locked until the account is in place.
        let Entry::Vacant(slot) = self.emails.entry(email.to_string()) else {
            return Err(email_conflict());
        };
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(
            user.id,
            UserWithPassword {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        slot.insert(user.id);
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserWithPassword>, AuthError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&id).map(|entry| entry.user.clone()))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AuthError> {
        let Some(old_email) = self.users.get(&id).map(|entry| entry.user.email.clone()) else {
            return Ok(None);
        };

        if old_email != email {
            match self.emails.entry(email.to_string()) {
                Entry::Occupied(owner) if *owner.get() != id => return Err(email_conflict()),
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove_if(&old_email, |_, owner| *owner == id);
        }

        let updated = self.users.get_mut(&id).map(|mut entry| {
            entry.user.email = email.to_string();
            entry.user.updated_at = Utc::now();
            entry.password_hash = password_hash.to_string();
            entry.user.clone()
        });
        if updated.is_none() {
            // Account vanished (reset) while the new email was reserved.
            self.emails.remove_if(email, |_, owner| *owner == id);
        }
        Ok(updated)
    }

    async fn upgrade(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(self
            .users
            .get_mut(&id)
            .map(|mut entry| {
                entry.user.is_chirpy_red = true;
                entry.user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let count = self.users.len() as u64;
        self.emails.clear();
        self.users.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create_user("a@example.com", "h").await.unwrap();
        assert!(matches!(
            store.create_user("a@example.com", "h2").await,
            Err(AuthError::Conflict(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_admit_one_owner_per_email() {
        let store = Arc::new(MemoryUserStore::new());
        for round in 0..50 {
            let email = format!("race-{round}@example.com");
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let email = email.clone();
                    tokio::spawn(async move { store.create_user(&email, "h").await })
                })
                .collect();

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => created += 1,
                    Err(AuthError::Conflict(_)) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(created, 1, "{email}");
        }
        assert_eq!(store.users.len(), 50);
        assert_eq!(store.emails.len(), 50);
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts_and_keeps_both_accounts() {
        let store = MemoryUserStore::new();
        let a = store.create_user("a@example.com", "ha").await.unwrap();
        store.create_user("b@example.com", "hb").await.unwrap();

        assert!(matches!(
            store.update_credentials(a.id, "b@example.com", "x").await,
            Err(AuthError::Conflict(_))
        ));
        let found = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.user.id, a.id);
        assert_eq!(found.password_hash, "ha");
    }

    #[tokio::test]
    async fn update_keeping_same_email_succeeds() {
        let store = MemoryUserStore::new();
        let user = store.create_user("same@example.com", "old").await.unwrap();
        let updated = store
            .update_credentials(user.id, "same@example.com", "new")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "same@example.com");
        let found = store.find_by_email("same@example.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
    }

    #[tokio::test]
    async fn update_unknown_user_reserves_nothing() {
        let store = MemoryUserStore::new();
        assert!(
            store
                .update_credentials(Uuid::new_v4(), "ghost@example.com", "h")
                .await
                .unwrap()
                .is_none()
        );
        store.create_user("ghost@example.com", "h").await.unwrap();
    }

    #[tokio::test]
    async fn delete_all_frees_emails() {
        let store = MemoryUserStore::new();
        store.create_user("gone@example.com", "h").await.unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert!(store.find_by_email("gone@example.com").await.unwrap().is_none());
        store.create_user("gone@example.com", "h").await.unwrap();
    }

    #[tokio::test]
    async fn upgrade_unknown_user_returns_false() {
        let store = MemoryUserStore::new();
        assert!(!store.upgrade(Uuid::new_v4()).await.unwrap());

        let user = store.create_user("b@example.com", "h").await.unwrap();
        assert!(store.upgrade(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().unwrap().is_chirpy_red);
    }

    #[tokio::test]
    async fn update_replaces_email_and_hash() {
        let store = MemoryUserStore::new();
        let user = store.create_user("old@example.com", "old").await.unwrap();
        let updated = store
            .update_credentials(user.id, "new@example.com", "new")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert!(store.find_by_email("old@example.com").await.unwrap().is_none());
        let found = store.find_by_email("new@example.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");
    }
}
