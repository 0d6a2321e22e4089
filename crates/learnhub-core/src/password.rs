//! Password hashing for student logins.
//!
//! Temporary passwords are hashed with bcrypt at import time so the login
//! path never has to compare plaintext.

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hashes with an explicit bcrypt cost (4..=31).
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::internal(anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("Failed to verify password: {}", e)))
}
