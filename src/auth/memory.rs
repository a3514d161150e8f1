use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::User;
use super::roles::{Role, VerificationStatus};
use crate::store::{StoreError, StoreResult};

/// Process-local [`UserStore`], used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token)
                    && u.reset_password_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn find_pending_admin_requests(&self) -> StoreResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| {
                u.role == Role::Admin && u.admin_verification.status == VerificationStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let (current_version, last_login) = match users.get(&user.id) {
            Some(current) => (current.version, current.last_login),
            None => return Err(StoreError::Stale),
        };
        if current_version != user.version {
            return Err(StoreError::Stale);
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        user.version += 1;
        user.last_login = last_login;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::Stale)?;
        user.last_login = Some(at);
        user.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            "Rowan".into(),
            "Ash".into(),
            email.into(),
            "hash".into(),
            Role::Normal,
            OffsetDateTime::now_utc(),
        )
    }

    #[tokio::test]
    async fn email_is_unique() {
        let store = MemoryUserStore::new();
        store.insert(user("rowan@garden.org")).await.unwrap();
        let err = store.insert(user("rowan@garden.org")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn stale_update_is_refused() {
        let store = MemoryUserStore::new();
        let created = store.insert(user("rowan@garden.org")).await.unwrap();

        let mut first = created.clone();
        first.first_name = "First".into();
        let mut second = created;
        second.first_name = "Second".into();

        let saved = store.update(first).await.expect("first writer wins");
        assert_eq!(saved.version, 2);
        assert!(matches!(store.update(second).await, Err(StoreError::Stale)));

        let stored = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "First");
    }

    #[tokio::test]
    async fn reset_lookup_honours_expiry() {
        let store = MemoryUserStore::new();
        let now = OffsetDateTime::now_utc();
        let mut u = user("rowan@garden.org");
        u.open_reset_window("tok".into(), now + time::Duration::minutes(5));
        store.insert(u).await.unwrap();

        assert!(store.find_by_reset_token("tok", now).await.unwrap().is_some());
        assert!(store
            .find_by_reset_token("tok", now + time::Duration::minutes(6))
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_reset_token("other", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_cannot_take_another_principals_email() {
        let store = MemoryUserStore::new();
        store.insert(user("a@garden.org")).await.unwrap();
        let mut b = store.insert(user("b@garden.org")).await.unwrap();
        b.email = "a@garden.org".into();
        assert!(matches!(store.update(b).await, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn login_stamp_keeps_version_and_survives_updates() {
        let store = MemoryUserStore::new();
        let created = store.insert(user("rowan@garden.org")).await.unwrap();
        let at = OffsetDateTime::now_utc();

        store.record_login(created.id, at).await.unwrap();
        let stamped = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stamped.last_login, Some(at));
        assert_eq!(stamped.version, created.version);

        // A writer that read the record before the stamp still saves.
        let mut renamed = created;
        renamed.first_name = "Renamed".into();
        let saved = store.update(renamed).await.unwrap();
        assert_eq!(saved.last_login, Some(at));

        assert!(matches!(
            store.record_login(Uuid::new_v4(), at).await,
            Err(StoreError::Stale)
        ));
    }
}
