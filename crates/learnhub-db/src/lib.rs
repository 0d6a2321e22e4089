//! # learnhub DB
//!
//! PostgreSQL connection pool initialisation.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//!
//! # Example
//!
//! ```ignore
//! use learnhub_db::init_db_pool;
//!
//! let pool = init_db_pool().await?;
//! ```

use std::env;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Error returned when the pool cannot be created.
#[derive(Debug, thiserror::Error)]
pub enum DbInitError {
    #[error("DATABASE_URL must be set")]
    MissingUrl,
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Initializes a PostgreSQL connection pool from `DATABASE_URL`.
///
/// The returned pool is cheaply cloneable and is shared through the
/// application state.
pub async fn init_db_pool() -> Result<PgPool, DbInitError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbInitError::MissingUrl)?;
    connect(&database_url).await
}

/// Connects to an explicit URL; used by the CLI when `--database-url` is given.
pub async fn connect(database_url: &str) -> Result<PgPool, DbInitError> {
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(DbInitError::Connect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(DbInitError::MissingUrl.to_string(), "DATABASE_URL must be set");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = connect("not-a-url").await;
        assert!(matches!(result, Err(DbInitError::Connect(_))));
    }
}
