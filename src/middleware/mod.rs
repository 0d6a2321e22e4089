//! Request extractors and route guards.
//!
//! - [`auth`]: `AdminUser` (JWT) and `SessionToken` (student/guest) extractors
//! - [`role`]: route-layer middleware restricting admin routes by role
//!
//! ```ignore
//! async fn list_students(admin: AdminUser, Query(q): Query<StudentQueryParams>) -> ... {
//!     let school_id = admin.school_scope(q.school_id)?;
//! }
//! ```

pub mod auth;
pub mod role;
