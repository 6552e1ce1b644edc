#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use authgate::app::{build_router, AppState};
use authgate::config::{AppConfig, AuthMode};
use authgate::database::{MemoryUserStore, NewUser, User, UserStore};
use authgate::services::LogNotifier;
use authgate::types::Role;

/// In-process server bound to a free port, backed by its own in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryUserStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_jwt() -> Result<Self> {
        let mut config = AppConfig::development();
        config.security.auth_mode = AuthMode::Jwt;
        config.security.jwt_secret = "integration-secret".to_string();
        Self::spawn_with(config).await
    }

    async fn spawn_with(mut config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        config.api.enable_request_logging = false;
        config.security.password_cost = authgate::auth::MIN_PASSWORD_COST;

        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::new(config, store.clone(), Arc::new(LogNotifier));
        let app = build_router(Arc::new(state));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Insert a user with the given role and block state directly into the store
    pub async fn seed(&self, role: Role, blocked: bool) -> User {
        let mut user = NewUser {
            name: format!("{} user", role),
            email: format!("{}@example.com", uuid::Uuid::new_v4().simple()),
            password_hash: "salt$unused".to_string(),
        }
        .into_user();
        user.role = role;
        user.blocked = blocked;
        self.store.insert(user.clone()).await;
        user
    }

    pub async fn reload(&self, user: &User) -> User {
        self.store
            .find_by_id(user.id)
            .await
            .expect("store read")
            .expect("user exists")
    }

    pub async fn get_as(&self, caller: &User, path: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("x-user-id", caller.id.to_string())
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post_as(&self, caller: &User, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("x-user-id", caller.id.to_string())
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }
}
