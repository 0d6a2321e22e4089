pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod session;

pub use router::init_auth_router;
pub use service::SessionService;
pub use session::{InMemorySessionRepository, SessionError, SessionRepository};
