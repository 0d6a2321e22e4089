//! Import data models, re-exported from `learnhub-models`.

pub use learnhub_models::imports::*;
