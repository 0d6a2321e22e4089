//! Bulk student import.
//!
//! A CSV file is parsed and validated row by row ([`parser`]), each accepted
//! row receives a username and temporary password ([`credentials`]), and the
//! whole batch is written in one statement through
//! [`StudentStore`](crate::modules::students::StudentStore). The issued
//! credentials can be downloaded as CSV ([`export`]).

pub mod controller;
pub mod credentials;
pub mod export;
pub mod model;
pub mod parser;
pub mod router;
pub mod service;

pub use router::init_import_router;
pub use service::{ImportError, ImportOptions, ImportService};
