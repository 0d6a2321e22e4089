//! Student domain models and DTOs.
//!
//! Students are created in bulk by the CSV import pipeline and then managed
//! individually by school admins.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::ids::{SchoolId, StudentId};
use crate::value_types::{Email, MobileNumber};

/// A student as stored. Credentials are never part of this view.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub student_name: String,
    pub class: String,
    pub section: Option<String>,
    pub mobile_number: MobileNumber,
    pub email: Option<Email>,
    pub username: String,
    pub is_active: bool,
    pub is_trial: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn identity(&self) -> StudentIdentity {
        StudentIdentity::new(&self.student_name, &self.class, self.mobile_number.as_str())
    }
}

/// A student joined with the secret needed to log them in.
#[derive(Debug, Clone, FromRow)]
pub struct StudentLogin {
    #[sqlx(flatten)]
    pub student: Student,
    pub password_hash: String,
}

/// One row handed to the bulk writer.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub school_id: SchoolId,
    pub student_name: String,
    pub class: String,
    pub section: Option<String>,
    pub mobile_number: MobileNumber,
    pub email: Option<Email>,
    pub username: String,
    pub temp_password: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_trial: bool,
}

impl NewStudent {
    pub fn identity(&self) -> StudentIdentity {
        StudentIdentity::new(&self.student_name, &self.class, self.mobile_number.as_str())
    }
}

/// The natural key of a student inside a school: name (case-insensitive),
/// class (case-insensitive) and mobile number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct StudentIdentity {
    pub student_name: String,
    pub class: String,
    pub mobile_number: String,
}

impl StudentIdentity {
    pub fn new(student_name: &str, class: &str, mobile_number: &str) -> Self {
        Self {
            student_name: student_name.trim().to_lowercase(),
            class: class.trim().to_lowercase(),
            mobile_number: mobile_number.to_string(),
        }
    }
}

/// The one-time credential handed back for a freshly imported student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentCredential {
    pub student_id: StudentId,
    pub student_name: String,
    pub class: String,
    pub section: Option<String>,
    pub username: String,
    pub temp_password: String,
    pub mobile_number: String,
    pub email: Option<String>,
}

/// DTO for updating a student. Only provided fields change.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 200, message = "Student name is required"))]
    pub student_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Class is required"))]
    pub class: Option<String>,
    #[validate(length(max = 50))]
    pub section: Option<String>,
    #[schema(value_type = Option<String>)]
    pub mobile_number: Option<MobileNumber>,
    #[schema(value_type = Option<String>)]
    pub email: Option<Email>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing students.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentQueryParams {
    /// Required for system admins; ignored for school admins
    #[serde(default, deserialize_with = "learnhub_core::serde::deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    /// Exact (case-insensitive) class filter
    pub class: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<Student>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_case_and_padding() {
        let a = StudentIdentity::new("  Priya Sharma ", "5", "9876543210");
        let b = StudentIdentity::new("priya sharma", "5", "9876543210");
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_distinguishes_class() {
        let a = StudentIdentity::new("Priya Sharma", "5", "9876543210");
        let b = StudentIdentity::new("Priya Sharma", "6", "9876543210");
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_dto_rejects_empty_name() {
        let dto = UpdateStudentDto {
            student_name: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_dto_rejects_bad_mobile_on_deserialize() {
        let result: Result<UpdateStudentDto, _> =
            serde_json::from_str(r#"{"mobile_number": "12345"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_dto_normalizes_mobile() {
        let dto: UpdateStudentDto =
            serde_json::from_str(r#"{"mobile_number": "98765-43210"}"#).unwrap();
        assert_eq!(dto.mobile_number.unwrap().as_str(), "9876543210");
    }
}
