use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{current_session, login_student, logout, start_guest};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_student))
        .route("/guest", post(start_guest))
        .route("/session", get(current_session))
        .route("/logout", post(logout))
}
