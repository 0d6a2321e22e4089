pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod store;

pub use router::init_schools_router;
pub use store::{PgSchoolStore, SchoolStore};
