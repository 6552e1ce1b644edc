use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{NewUser, User};
use crate::database::store::{role_changed, StoreError, UserStore};
use crate::types::Role;

/// Process-local user store, used when no `DATABASE_URL` is configured and in tests.
///
/// Guarded writes compare and update under a single write-lock acquisition.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing sign-up defaults.
    /// Seeding root accounts and test fixtures go through here.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut User) -> Result<(), StoreError> + Send,
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply(user)?;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = new_user.into_user();
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} is already registered", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        let name = name.to_string();
        self.update(id, move |user| {
            user.name = name;
            Ok(())
        })
        .await
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let password_hash = password_hash.to_string();
        self.update(id, move |user| {
            user.password_hash = password_hash;
            Ok(())
        })
        .await
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool, expected_role: Role) -> Result<(), StoreError> {
        self.update(id, move |user| {
            if user.role != expected_role {
                return Err(role_changed(id, expected_role, user.role));
            }
            user.blocked = blocked;
            Ok(())
        })
        .await
    }

    async fn set_role(&self, id: Uuid, role: Role, expected_role: Role) -> Result<(), StoreError> {
        self.update(id, move |user| {
            if user.role != expected_role {
                return Err(role_changed(id, expected_role, user.role));
            }
            user.role = role;
            Ok(())
        })
        .await
    }
}
