// Credential storage: bcrypt hashes in their standard `$2b$<cost>$...` encoding

use thiserror::Error;

pub use bcrypt::DEFAULT_COST as DEFAULT_PASSWORD_COST;

/// Lowest work factor bcrypt accepts (bcrypt's `MIN_COST` is not exported)
pub const MIN_PASSWORD_COST: u32 = 4;

/// Highest work factor bcrypt accepts
pub const MAX_PASSWORD_COST: u32 = 31;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// False for a wrong password and for anything that is not a bcrypt hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}
