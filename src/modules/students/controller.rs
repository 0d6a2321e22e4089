use axum::{
    Json,
    extract::{Path, Query, State},
};
use learnhub_core::errors::AppError;
use learnhub_models::ids::StudentId;
use learnhub_models::sessions::MessageResponse;
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::middleware::auth::AdminUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::students::model::{
    PaginatedStudentsResponse, Student, StudentQueryParams, UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// `?school_id=` for single-student routes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolScopeQuery {
    /// Required for system admins
    #[serde(default, deserialize_with = "learnhub_core::serde::deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQueryParams),
    responses(
        (status = 200, description = "List of students", body = PaginatedStudentsResponse),
        (status = 400, description = "school_id missing for system admin", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, admin))]
pub async fn get_students(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<StudentQueryParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let school_id = admin.school_scope(params.school_id)?;
    let students = StudentService::list_students(state.students.as_ref(), school_id, &params).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID"),
        SchoolScopeQuery
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, admin))]
pub async fn get_student(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<StudentId>,
    Query(scope): Query<SchoolScopeQuery>,
) -> Result<Json<Student>, AppError> {
    let school_id = admin.school_scope(scope.school_id)?;
    let student = StudentService::get_student(state.students.as_ref(), school_id, id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    request_body = UpdateStudentDto,
    params(
        ("id" = Uuid, Path, description = "Student ID"),
        SchoolScopeQuery
    ),
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Another student has the same name, class and mobile", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, admin, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<StudentId>,
    Query(scope): Query<SchoolScopeQuery>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let school_id = admin.school_scope(scope.school_id)?;
    let student =
        StudentService::update_student(state.students.as_ref(), school_id, id, &dto).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID"),
        SchoolScopeQuery
    ),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, admin))]
pub async fn delete_student(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<StudentId>,
    Query(scope): Query<SchoolScopeQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let school_id = admin.school_scope(scope.school_id)?;
    StudentService::delete_student(state.students.as_ref(), school_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Student deleted successfully".to_string(),
    }))
}
