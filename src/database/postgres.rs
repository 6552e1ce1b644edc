use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{NewUser, User};
use crate::database::store::{role_changed, StoreError, UserStore};
use crate::types::Role;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, blocked, created_at, updated_at";

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'default'
                      CHECK (role IN ('default', 'admin', 'root')),
        blocked       BOOLEAN NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
"#;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict("email is already registered".to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// PostgreSQL-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using a `postgres://` URL and make sure the users table exists
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let url = url::Url::parse(database_url)
            .map_err(|_| StoreError::Backend("invalid database URL".to_string()))?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(StoreError::Backend(format!("unsupported database scheme '{}'", url.scheme())));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        info!("Connected user store to {}", url.host_str().unwrap_or("localhost"));
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Resolve why a guarded update touched no rows
    async fn explain_miss(&self, id: Uuid, expected_role: Role) -> StoreError {
        match self.find_by_id(id).await {
            Ok(Some(user)) => role_changed(id, expected_role, user.role),
            Ok(None) => StoreError::NotFound(id),
            Err(e) => e,
        }
    }

    fn require_updated(id: Uuid, rows: u64) -> Result<(), StoreError> {
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = new_user.into_user();
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, blocked, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.blocked)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Self::require_updated(id, result.rows_affected())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Self::require_updated(id, result.rows_affected())
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool, expected_role: Role) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET blocked = $2, updated_at = now() WHERE id = $1 AND role = $3",
        )
        .bind(id)
        .bind(blocked)
        .bind(expected_role.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_miss(id, expected_role).await);
        }
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role, expected_role: Role) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 AND role = $3",
        )
        .bind(id)
        .bind(role.as_str())
        .bind(expected_role.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_miss(id, expected_role).await);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
