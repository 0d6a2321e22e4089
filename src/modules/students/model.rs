//! Student data models and DTOs.
//!
//! Re-exported from the `learnhub-models` crate.

pub use learnhub_models::students::*;
