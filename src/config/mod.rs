use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::{DEFAULT_PASSWORD_COST, MAX_PASSWORD_COST, MIN_PASSWORD_COST};

/// Upper bound for issued token lifetime
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
}

/// How callers are identified on authenticated routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Trust a gateway-provided identity header
    Header,
    /// Require a bearer token issued by sign-in
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub auth_mode: AuthMode,
    pub identity_header: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// bcrypt work factor for stored credentials
    pub password_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Endpoint receiving `{to, subject, body}` JSON; notifications are only logged when absent
    pub webhook_url: Option<String>,
    pub sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // API overrides
        if let Some(v) = lookup("API_PORT").or_else(|| lookup("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = lookup("SECURITY_AUTH_MODE") {
            match v.as_str() {
                "header" => self.security.auth_mode = AuthMode::Header,
                "jwt" => self.security.auth_mode = AuthMode::Jwt,
                other => tracing::warn!("Ignoring unknown SECURITY_AUTH_MODE '{}'", other),
            }
        }
        if let Some(v) = lookup("SECURITY_IDENTITY_HEADER") {
            self.security.identity_header = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            match v.parse::<u64>() {
                Ok(hours) if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) => {
                    self.security.jwt_expiry_hours = hours;
                }
                _ => tracing::warn!(
                    "Ignoring SECURITY_JWT_EXPIRY_HOURS '{}', expected 1..={}",
                    v,
                    MAX_JWT_EXPIRY_HOURS
                ),
            }
        }
        if let Some(v) = lookup("SECURITY_PASSWORD_COST") {
            match v.parse::<u32>() {
                Ok(cost) if (MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&cost) => {
                    self.security.password_cost = cost;
                }
                _ => tracing::warn!(
                    "Ignoring SECURITY_PASSWORD_COST '{}', expected {}..={}",
                    v,
                    MIN_PASSWORD_COST,
                    MAX_PASSWORD_COST
                ),
            }
        }

        // Mail overrides
        if let Some(v) = lookup("MAIL_WEBHOOK_URL") {
            self.mail.webhook_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("MAIL_SENDER") {
            self.mail.sender = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                auth_mode: AuthMode::Header,
                identity_header: "x-user-id".to_string(),
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                password_cost: 10,
            },
            mail: MailConfig {
                webhook_url: None,
                sender: "no-reply@localhost".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 8080,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                auth_mode: AuthMode::Jwt,
                identity_header: "x-user-id".to_string(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                password_cost: DEFAULT_PASSWORD_COST,
            },
            mail: MailConfig {
                webhook_url: None,
                sender: "no-reply@staging.example.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                auth_mode: AuthMode::Jwt,
                identity_header: "x-user-id".to_string(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                password_cost: DEFAULT_PASSWORD_COST,
            },
            mail: MailConfig {
                webhook_url: None,
                sender: "no-reply@example.com".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
