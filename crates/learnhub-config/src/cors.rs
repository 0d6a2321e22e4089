//! Browser origins allowed to call the admin and student APIs.
//!
//! - `ALLOWED_ORIGINS`: Comma-separated origins (default: the local admin
//!   dashboard and student portal dev servers)

use std::env;

const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: parse_origins(DEFAULT_ORIGINS),
        }
    }
}

impl CorsConfig {
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => Self {
                allowed_origins: parse_origins(&raw),
            },
            Err(_) => Self::default(),
        }
    }
}

/// Blank entries are dropped so a trailing comma is harmless.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
