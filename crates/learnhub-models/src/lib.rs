//! # learnhub Models
//!
//! Domain models and DTOs for the learnhub API.
//!
//! - [`ids`]: Typed UUID identifiers
//! - [`value_types`]: Validated mobile numbers and email addresses
//! - [`schools`]: School entity and admin DTOs
//! - [`students`]: Student entity, bulk-write rows and credentials
//! - [`imports`]: CSV import rows, outcomes and reports
//! - [`sessions`]: Student and guest sessions

pub mod ids;
pub mod imports;
pub mod schools;
pub mod sessions;
pub mod students;
pub mod value_types;

pub use ids::{SchoolId, StudentId};
pub use imports::{
    ImportFormat, ImportQuery, ImportRejection, ImportReport, ParseOutcome, ParsedStudentRow,
};
pub use schools::{CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams};
pub use sessions::{MessageResponse, Session, SessionKind, StudentLoginRequest};
pub use students::{
    NewStudent, PaginatedStudentsResponse, Student, StudentCredential, StudentIdentity,
    StudentLogin, StudentQueryParams, UpdateStudentDto,
};
pub use value_types::{Email, MobileNumber, ValueTypeError};
