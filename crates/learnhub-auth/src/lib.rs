//! # learnhub Auth
//!
//! Admin authentication for the learnhub API.
//!
//! Administrators authenticate with short-lived JWTs signed with
//! `JWT_SECRET`. Tokens are minted by the operator CLI
//! (`learnhub-cli issue-token`) and carry the admin's role and, for school
//! admins, the school they manage.
//!
//! Students and guests do not use JWTs; they hold opaque session tokens
//! managed by the API's session repository.
//!
//! # Example
//!
//! ```ignore
//! use learnhub_auth::{AdminRole, create_admin_token, verify_token};
//! use learnhub_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_admin_token("ops@school.test", AdminRole::SchoolAdmin, Some(school_id), &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.school_id, Some(school_id));
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{AdminClaims, AdminRole};
pub use jwt::{create_admin_token, verify_token};
