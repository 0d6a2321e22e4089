//! Student and guest sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{SchoolId, StudentId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionKind {
    Student {
        student_id: StudentId,
        school_id: SchoolId,
        username: String,
        student_name: String,
    },
    /// Unauthenticated preview of the catalogue
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    #[serde(flatten)]
    pub kind: SessionKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_guest(&self) -> bool {
        matches!(self.kind, SessionKind::Guest)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StudentLoginRequest {
    #[validate(length(min = 1, max = 100, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
