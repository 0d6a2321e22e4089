//! Listener and logging settings.
//!
//! - `SERVER_HOST` / `SERVER_PORT`: API listener (default: `0.0.0.0:3000`)
//! - `METRICS_PORT`: Prometheus listener (default: 9090)
//! - `LOG_LEVEL`: Default level for the crate's own targets (default: `info`)
//! - `LOG_DIR`: Rolling log file directory (default: `storage/logs`)

use std::env;

use crate::env_or;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub log_level: String,
    pub log_dir: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("SERVER_PORT", 3000),
            metrics_port: env_or("METRICS_PORT", 9090),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}
