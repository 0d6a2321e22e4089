//! JWT claim structures for admin tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Administrative role carried in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Manages schools; may act on any school's students with `?school_id=`.
    SystemAdmin,
    /// Manages the students of exactly one school.
    SchoolAdmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::SchoolAdmin => "school_admin",
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "system_admin" => Ok(Self::SystemAdmin),
            "school_admin" => Ok(Self::SchoolAdmin),
            other => Err(format!("unknown admin role '{}'", other)),
        }
    }
}

/// JWT claims for admin access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminClaims {
    /// Admin identifier (usually an email)
    pub sub: String,
    pub role: AdminRole,
    /// School scope; required for school admins, absent for system admins
    pub school_id: Option<Uuid>,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued-at (Unix timestamp)
    pub iat: usize,
}

impl AdminClaims {
    pub fn is_system_admin(&self) -> bool {
        self.role == AdminRole::SystemAdmin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_accepts_hyphens() {
        assert_eq!("school-admin".parse::<AdminRole>(), Ok(AdminRole::SchoolAdmin));
        assert_eq!("SYSTEM_ADMIN".parse::<AdminRole>(), Ok(AdminRole::SystemAdmin));
        assert!("teacher".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&AdminRole::SchoolAdmin).unwrap();
        assert_eq!(json, r#""school_admin""#);
    }
}
