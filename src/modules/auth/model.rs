//! Session DTOs, shared with the `learnhub-models` crate.

pub use learnhub_models::sessions::*;
