//! Bulk student import limits.
//!
//! # Environment Variables
//!
//! - `IMPORT_MAX_ROWS`: Maximum data rows accepted per file (default: 1000)
//! - `IMPORT_MAX_UPLOAD_BYTES`: Request body cap for CSV uploads (default: 2 MiB)
//! - `IMPORT_PASSWORD_HASH_COST`: bcrypt cost for temporary passwords (default: 12)

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportConfig {
    pub max_rows: usize,
    pub max_upload_bytes: usize,
    pub password_hash_cost: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            max_upload_bytes: 2 * 1024 * 1024,
            password_hash_cost: 12,
        }
    }
}

impl ImportConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_rows: env_or("IMPORT_MAX_ROWS", defaults.max_rows),
            max_upload_bytes: env_or("IMPORT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            // bcrypt rejects costs outside 4..=31
            password_hash_cost: env_or("IMPORT_PASSWORD_HASH_COST", defaults.password_hash_cost)
                .clamp(4, 31),
        }
    }
}
