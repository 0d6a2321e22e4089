//! Session lifetimes for student and guest logins.
//!
//! - `SESSION_TTL_SECONDS`: Student session lifetime (default: 7 days)
//! - `GUEST_SESSION_TTL_SECONDS`: Guest preview lifetime (default: 30 minutes)

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub student_ttl_seconds: i64,
    pub guest_ttl_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            student_ttl_seconds: 7 * 24 * 60 * 60,
            guest_ttl_seconds: 30 * 60,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            student_ttl_seconds: env_or("SESSION_TTL_SECONDS", defaults.student_ttl_seconds),
            guest_ttl_seconds: env_or("GUEST_SESSION_TTL_SECONDS", defaults.guest_ttl_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.student_ttl_seconds, 604800);
        assert_eq!(config.guest_ttl_seconds, 1800);
    }
}
