use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use learnhub_core::errors::AppError;
use tracing::instrument;

use super::export::{download_csv, export_credentials_to_csv, generate_csv_template};
use super::model::{ImportFormat, ImportQuery, ImportRejection, ImportReport, ParseOutcome};
use super::service::{ImportError, ImportOptions, ImportService};
use crate::middleware::auth::AdminUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

pub const TEMPLATE_FILENAME: &str = "student_import_template.csv";

/// Download a sample CSV to fill in
#[utoipa::path(
    get,
    path = "/api/students/import/template",
    responses(
        (status = 200, description = "CSV template", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Import"
)]
pub async fn download_template() -> Result<Response, AppError> {
    let template = generate_csv_template()?;
    Ok(download_csv(TEMPLATE_FILENAME, template))
}

/// Parse and validate a CSV without writing anything
#[utoipa::path(
    post,
    path = "/api/students/import/preview",
    request_body(content = String, content_type = "text/csv", description = "CSV file contents"),
    responses(
        (status = 200, description = "Per-row validation result", body = ParseOutcome),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 413, description = "File too large"),
        (status = 422, description = "Missing headers, no data rows or too many rows", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Import"
)]
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn preview_import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ParseOutcome>, ImportError> {
    let outcome = ImportService::preview(&body, &state.import_config)?;
    Ok(Json(outcome))
}

/// Import students and issue their credentials
///
/// With `format=csv` the response is the credentials sheet as a download.
#[utoipa::path(
    post,
    path = "/api/students/import",
    params(ImportQuery),
    request_body(content = String, content_type = "text/csv", description = "CSV file contents"),
    responses(
        (status = 200, description = "Students imported", body = ImportReport),
        (status = 400, description = "school_id missing for system admin", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 409, description = "Students already imported or duplicated in the file", body = ErrorResponse),
        (status = 413, description = "File too large"),
        (status = 422, description = "Rows failed validation", body = ImportRejection)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Import"
)]
#[instrument(skip(state, admin, body), fields(bytes = body.len()))]
pub async fn commit_import(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Result<Response, ImportError> {
    let school_id = admin.school_scope(query.school_id)?;
    let school = state.schools.get(school_id).await?;

    let options = ImportOptions {
        skip_invalid: query.skip_invalid.unwrap_or(false),
    };
    let report = ImportService::import(
        state.students.as_ref(),
        &school,
        &body,
        options,
        &state.import_config,
    )
    .await?;

    match query.format.unwrap_or_default() {
        ImportFormat::Json => Ok(Json(report).into_response()),
        ImportFormat::Csv => {
            let csv = export_credentials_to_csv(&report.credentials).map_err(AppError::internal)?;
            let filename = format!("{}_credentials.csv", school.code.to_lowercase());
            Ok(download_csv(&filename, csv))
        }
    }
}

