use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::app::{build_router, AppState};
use crate::auth::hash_password;
use crate::config::{config, AppConfig, AuthMode, Environment};
use crate::database::{MemoryUserStore, NewUser, PgUserStore, User, UserStore};
use crate::services::build_notifier;
use crate::types::Role;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Account service with role-hierarchy authorization")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT)")]
        port: Option<u16>,

        #[arg(long, requires = "root_password", help = "Ensure a root account with this email exists at startup")]
        root_email: Option<String>,

        #[arg(long, requires = "root_email", help = "Password for the bootstrap root account")]
        root_password: Option<String>,
    },

    #[command(about = "Create or promote the root account (requires DATABASE_URL)")]
    SeedRoot {
        #[arg(long, default_value = "root")]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config().clone();

    match cli.command {
        Commands::Serve { port, root_email, root_password } => {
            let users = open_store(&config).await?;
            if let (Some(email), Some(password)) = (root_email, root_password) {
                let cost = config.security.password_cost;
                let root = seed_root(users.as_ref(), "root", &email, &password, cost).await?;
                tracing::info!(user = %root.id, "bootstrap root account ready");
            }
            serve(config, users, port).await
        }
        Commands::SeedRoot { name, email, password } => {
            let url = config
                .database
                .url
                .as_deref()
                .context("seed-root requires DATABASE_URL")?;
            let store = PgUserStore::connect(url, config.database.max_connections).await?;
            let root = seed_root(&store, &name, &email, &password, config.security.password_cost).await?;
            tracing::info!(user = %root.id, email = %root.email, "root account ready");
            Ok(())
        }
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match config.database.url.as_deref() {
        Some(url) => {
            let store = PgUserStore::connect(url, config.database.max_connections).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user store");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

async fn serve(config: AppConfig, users: Arc<dyn UserStore>, port: Option<u16>) -> anyhow::Result<()> {
    if config.security.auth_mode == AuthMode::Jwt {
        anyhow::ensure!(
            !config.security.jwt_secret.is_empty(),
            "SECURITY_JWT_SECRET must be set when SECURITY_AUTH_MODE=jwt"
        );
    }
    if config.security.auth_mode == AuthMode::Header && config.environment != Environment::Development {
        tracing::warn!(
            "Trusting the '{}' header for caller identity; an upstream gateway must set it",
            config.security.identity_header
        );
    }

    let port = port.unwrap_or(config.api.port);
    let notifier = build_notifier(&config.mail);
    let state = Arc::new(AppState::new(config, users, notifier));
    let app = build_router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("authgate listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")
}

/// Make sure an account with `email` exists, holds the root role, is not
/// blocked and signs in with `password`. This is the only way an account
/// becomes root, and the recovery path for a lost root credential.
pub async fn seed_root(
    users: &dyn UserStore,
    name: &str,
    email: &str,
    password: &str,
    password_cost: u32,
) -> anyhow::Result<User> {
    let password_hash = hash_password(password, password_cost)?;

    let user = match users.find_by_email(email).await? {
        Some(user) => {
            users.set_password_hash(user.id, &password_hash).await?;
            if user.blocked {
                users.set_blocked(user.id, false, user.role).await?;
                tracing::warn!(user = %user.id, "unblocked account while seeding root");
            }
            user
        }
        None => {
            users
                .create(NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash,
                })
                .await?
        }
    };

    if user.role != Role::Root {
        users.set_role(user.id, Role::Root, user.role).await?;
    }

    users
        .find_by_id(user.id)
        .await?
        .context("root account disappeared after seeding")
}
