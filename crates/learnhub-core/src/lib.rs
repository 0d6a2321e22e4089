//! # learnhub Core
//!
//! Core types, errors, and utilities for the learnhub API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters and response metadata
//! - [`password`]: bcrypt hashing for student passwords
//! - [`serde`]: Custom serde helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use learnhub_core::errors::AppError;
//! use learnhub_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//! let hash = hash_password("Hk7pQ2xz")?;
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, hash_password_with_cost, verify_password};
