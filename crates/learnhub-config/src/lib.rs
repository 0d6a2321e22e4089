//! # learnhub Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`cors`]: CORS allowed origins
//! - [`import`]: Bulk student import limits
//! - [`jwt`]: Admin token signing
//! - [`server`]: Listen addresses and logging
//! - [`session`]: Student and guest session lifetimes
//!
//! Every `from_env` falls back to a default when a variable is unset or
//! cannot be parsed.
//!
//! # Example
//!
//! ```ignore
//! use learnhub_config::{ImportConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let import_config = ImportConfig::from_env();
//! ```

pub mod cors;
pub mod import;
pub mod jwt;
pub mod server;
pub mod session;

pub use cors::CorsConfig;
pub use import::ImportConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use session::SessionConfig;

/// Reads and parses an environment variable, falling back to `default`.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
