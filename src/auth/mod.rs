pub mod authenticator;
pub mod claims;
pub mod password;

pub use authenticator::{build_authenticator, Authenticator, HeaderAuthenticator, Identity, JwtAuthenticator};
pub use claims::{generate_jwt, validate_jwt, Claims, JwtError};
pub use password::{
    hash_password, verify_password, PasswordError, DEFAULT_PASSWORD_COST, MAX_PASSWORD_COST, MIN_PASSWORD_COST,
};

use thiserror::Error;

/// Why a request carries no usable caller identity
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Identity missing or not in the expected format
    #[error("{0}")]
    Malformed(String),

    /// Identity present and well-formed but not acceptable (bad signature, expired)
    #[error("{0}")]
    Rejected(String),
}
