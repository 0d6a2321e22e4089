use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;
use utoipa::ToSchema;

use super::model::{MessageResponse, Session, StudentLoginRequest};
use crate::middleware::auth::SessionToken;
use crate::state::AppState;
use crate::validator::ValidatedJson;
use learnhub_core::errors::AppError;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Log in with the username and temporary password issued at import
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = StudentLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = Session),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account inactive", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<StudentLoginRequest>,
) -> Result<Json<Session>, AppError> {
    let session = state.sessions.login(state.students.as_ref(), &dto).await?;
    Ok(Json(session))
}

/// Start a guest preview session
#[utoipa::path(
    post,
    path = "/api/auth/guest",
    responses(
        (status = 201, description = "Guest session started", body = Session)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn start_guest(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = state.sessions.start_guest()?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Current session for the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Active session", body = Session),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("session_token" = []))
)]
pub async fn current_session(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<Session>, AppError> {
    Ok(Json(state.sessions.current(&token)?))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("session_token" = []))
)]
#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Json<MessageResponse>, AppError> {
    state.sessions.logout(&token)?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
