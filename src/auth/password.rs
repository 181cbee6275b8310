use crate::error::AppError;
use bcrypt::{hash, verify};

/// Hashes a password with bcrypt. `cost` trades latency for brute-force
/// resistance; 10 keeps a verification in the tens of milliseconds.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
