use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{NewUser, User};
use crate::types::Role;

/// Errors from a [`UserStore`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(Uuid),

    /// A uniqueness constraint or a guarded write's expectation did not hold
    #[error("{0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Persistence contract for user records.
///
/// Role and block-state writes are conditional: they apply only while the
/// stored role still equals `expected_role`, so an authorization decision made
/// against a read cannot be applied to a record whose role moved underneath it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `Conflict` if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), StoreError>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    async fn set_blocked(&self, id: Uuid, blocked: bool, expected_role: Role) -> Result<(), StoreError>;

    async fn set_role(&self, id: Uuid, role: Role, expected_role: Role) -> Result<(), StoreError>;

    /// Liveness probe for the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) fn role_changed(id: Uuid, expected: Role, actual: Role) -> StoreError {
    StoreError::Conflict(format!(
        "user {} changed concurrently (expected role {}, found {})",
        id, expected, actual
    ))
}
