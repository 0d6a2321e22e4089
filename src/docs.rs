use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{MessageResponse, Session, SessionKind, StudentLoginRequest};
use crate::modules::imports::model::{
    ImportFormat, ImportRejection, ImportReport, ParseOutcome, ParsedStudentRow,
};
use crate::modules::schools::model::{CreateSchoolDto, PaginatedSchoolsResponse, School};
use crate::modules::students::model::{
    PaginatedStudentsResponse, Student, StudentCredential, UpdateStudentDto,
};
use learnhub_core::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_student,
        crate::modules::auth::controller::start_guest,
        crate::modules::auth::controller::current_session,
        crate::modules::auth::controller::logout,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::get_all_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::delete_school,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::imports::controller::download_template,
        crate::modules::imports::controller::preview_import,
        crate::modules::imports::controller::commit_import,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            StudentLoginRequest,
            Session,
            SessionKind,
            School,
            CreateSchoolDto,
            PaginatedSchoolsResponse,
            Student,
            UpdateStudentDto,
            PaginatedStudentsResponse,
            StudentCredential,
            ParsedStudentRow,
            ParseOutcome,
            ImportReport,
            ImportRejection,
            ImportFormat,
            PaginationMeta,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Student and guest sessions"),
        (name = "Schools", description = "School management (system admins)"),
        (name = "Students", description = "Student records of one school"),
        (name = "Student Import", description = "Bulk CSV import and credential issue")
    ),
    info(
        title = "learnhub API",
        version = "0.1.0",
        description = "Student roster service: bulk CSV import, credentials and sessions.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Admin token issued by `learnhub-cli issue-token`"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Opaque token returned by /api/auth/login or /api/auth/guest"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_import_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/students/import",
            "/api/students/import/preview",
            "/api/students/import/template",
            "/api/auth/login",
            "/api/schools/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_security_schemes_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.security_schemes.contains_key("session_token"));
    }
}
