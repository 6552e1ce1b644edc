use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

/// Stored account record. `password_hash` never leaves the service; clients
/// only ever see [`UserFullInfo`] or [`UserShortInfo`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_info(&self) -> UserFullInfo {
        UserFullInfo {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            blocked: self.blocked,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn short_info(&self) -> UserShortInfo {
        UserShortInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Fields supplied at sign-up. Role and block state are not client-settable.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Materialize the record a store persists: role `default`, not blocked.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email.to_lowercase(),
            password_hash: self.password_hash,
            role: Role::Default,
            blocked: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFullInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShortInfo {
    pub id: Uuid,
    pub name: String,
}
