use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

use super::claims::validate_jwt;
use super::AuthError;
use crate::config::{AuthMode, SecurityConfig};

/// Caller identity established by an [`Authenticator`], before any lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

/// Turns request headers into a caller identity. Authorization never looks at
/// headers directly, so the mechanism can change without touching it.
pub trait Authenticator: Send + Sync {
    fn name(&self) -> &'static str;

    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError>;
}

/// Trusts an identity header set by an upstream gateway verbatim
pub struct HeaderAuthenticator {
    header: String,
}

impl HeaderAuthenticator {
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into().to_ascii_lowercase() }
    }
}

impl Authenticator for HeaderAuthenticator {
    fn name(&self) -> &'static str {
        "header"
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let raw = headers
            .get(self.header.as_str())
            .ok_or_else(|| AuthError::Malformed(format!("missing {} header", self.header)))?
            .to_str()
            .map_err(|_| AuthError::Malformed("invalid input".to_string()))?;

        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AuthError::Malformed("invalid input".to_string()))?;

        Ok(Identity { user_id })
    }
}

/// Validates `Authorization: Bearer <jwt>` tokens issued by sign-in
pub struct JwtAuthenticator {
    secret: String,
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl Authenticator for JwtAuthenticator {
    fn name(&self) -> &'static str {
        "jwt"
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = extract_bearer(headers)?;
        let claims = validate_jwt(&token, &self.secret)
            .map_err(|e| AuthError::Rejected(e.to_string()))?;
        Ok(Identity { user_id: claims.sub })
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AuthError::Malformed("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::Malformed("Invalid Authorization header format".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(AuthError::Malformed("Empty JWT token".to_string())),
        None => Err(AuthError::Malformed(
            "Authorization header must use Bearer token format".to_string(),
        )),
    }
}

pub fn build_authenticator(security: &SecurityConfig) -> Arc<dyn Authenticator> {
    match security.auth_mode {
        AuthMode::Header => Arc::new(HeaderAuthenticator::new(security.identity_header.clone())),
        AuthMode::Jwt => Arc::new(JwtAuthenticator::new(security.jwt_secret.clone())),
    }
}
