//! School domain models and DTOs.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::SchoolId;

const SCHOOL_CODE_PREFIX: &str = "SCH";

/// A school. Its `code` prefixes every imported student's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    /// Short code such as `SCH-DPS-01`
    pub code: String,
    /// `code` as it appears in usernames, e.g. `dps01`. Unique across schools.
    pub username_prefix: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lowercased code with a leading `SCH` and every hyphen removed.
///
/// Distinct codes can share a prefix (`SCH-GPS`, `GPS`, `G-PS`), so the
/// prefix is what must be unique between schools.
pub fn username_prefix(code: &str) -> String {
    let code = code.trim();
    let rest = match code.get(..SCHOOL_CODE_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(SCHOOL_CODE_PREFIX) => {
            &code[SCHOOL_CODE_PREFIX.len()..]
        }
        _ => code,
    };
    rest.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Codes are letters, digits and hyphens so they survive in usernames, and
/// must leave something once the `SCH` marker is stripped.
fn validate_school_code(code: &str) -> Result<(), ValidationError> {
    let allowed = code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !allowed {
        return Err(ValidationError::new("school_code")
            .with_message("code may only contain letters, digits and hyphens".into()));
    }
    if username_prefix(code).is_empty() {
        return Err(ValidationError::new("school_code")
            .with_message("code must contain letters or digits besides the SCH marker".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(
        length(min = 2, max = 32, message = "code must be 2-32 characters"),
        custom(function = "validate_school_code")
    )]
    pub code: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolFilterParams {
    /// Case-insensitive substring match on the school name
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(code: &str) -> CreateSchoolDto {
        CreateSchoolDto {
            name: "Greenfield Public School".to_string(),
            code: code.to_string(),
            address: None,
        }
    }

    #[test]
    fn test_valid_codes() {
        assert!(dto("SCH-GPS-01").validate().is_ok());
        assert!(dto("gps1").validate().is_ok());
    }

    #[test]
    fn test_invalid_codes() {
        assert!(dto("SCH GPS").validate().is_err());
        assert!(dto("--").validate().is_err());
        assert!(dto("x").validate().is_err());
        assert!(dto("SCH_GPS").validate().is_err());
    }

    #[test]
    fn test_bare_marker_codes_rejected() {
        assert!(dto("SCH").validate().is_err());
        assert!(dto("sch-").validate().is_err());
        assert!(dto("SCH-1").validate().is_ok());
    }

    #[test]
    fn test_username_prefix_normalization() {
        assert_eq!(username_prefix("SCH-DPS-01"), "dps01");
        for code in ["SCH-GPS", "GPS", "SCHGPS", "G-PS", " sch-gps "] {
            assert_eq!(username_prefix(code), "gps", "code {code}");
        }
        assert_eq!(username_prefix("SCHOOL"), "ool");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut invalid = dto("SCH-GPS");
        invalid.name = String::new();
        assert!(invalid.validate().is_err());
    }
}
