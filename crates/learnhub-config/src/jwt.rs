use std::env;

use crate::env_or;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Admin access token lifetime in seconds.
    pub access_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env_or("JWT_ACCESS_EXPIRY", 3600),
        }
    }
}
