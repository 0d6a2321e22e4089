use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use learnhub_core::errors::AppError;
use learnhub_models::ids::SchoolId;
use tracing::instrument;
use uuid::Uuid;

use super::model::{CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams};
use super::service::SchoolService;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created successfully", body = School),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - System admin only", body = ErrorResponse),
        (status = 409, description = "School code already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_school(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(state.schools.as_ref(), &dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Paginated list of schools", body = PaginatedSchoolsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - System admin only", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, filters))]
pub async fn get_all_schools(
    State(state): State<AppState>,
    filters: Result<Query<SchoolFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let schools = SchoolService::get_all_schools(state.schools.as_ref(), &filters).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(
        ("id" = Uuid, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(state.schools.as_ref(), SchoolId::from(id)).await?;
    Ok(Json(school))
}

/// Deletes the school and every student imported into it
#[utoipa::path(
    delete,
    path = "/api/schools/{id}",
    params(
        ("id" = Uuid, Path, description = "School ID")
    ),
    responses(
        (status = 204, description = "School deleted successfully"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - System admin only", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SchoolService::delete_school(state.schools.as_ref(), SchoolId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
