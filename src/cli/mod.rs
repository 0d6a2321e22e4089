//! Operator commands behind `learnhub-cli`.
//!
//! The binary only parses arguments and prompts; everything that touches
//! files, stores or tokens lives here so it can be tested against
//! [`MemoryStore`](crate::modules::students::store::MemoryStore).

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use learnhub_auth::{AdminRole, create_admin_token};
use learnhub_config::{ImportConfig, JwtConfig};
use learnhub_models::ids::SchoolId;
use learnhub_models::imports::{ImportReport, ParseOutcome};
use learnhub_models::schools::{CreateSchoolDto, School};
use uuid::Uuid;
use validator::Validate;

use crate::metrics;
use crate::modules::imports::service::{ImportError, ImportOptions, ImportService};
use crate::modules::schools::service::SchoolService;
use crate::modules::schools::store::SchoolStore;
use crate::modules::students::store::StudentStore;

/// Reads a CSV file as UTF-8 text.
pub fn read_csv(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parses a file without touching the database.
pub fn validate_file(path: &Path, config: &ImportConfig) -> anyhow::Result<ParseOutcome> {
    let content = read_csv(path)?;
    Ok(ImportService::preview(&content, config)?)
}

/// Human-readable summary of a parse, one line per invalid row.
pub fn render_outcome(outcome: &ParseOutcome) -> String {
    let mut out = String::new();
    if outcome.is_structural_error() {
        for row in &outcome.rows {
            let _ = writeln!(out, "error: {}", row.validation_errors.join("; "));
        }
        return out;
    }

    let _ = writeln!(
        out,
        "{} rows, {} valid, {} with errors",
        outcome.total_rows,
        outcome.valid_rows,
        outcome.total_rows - outcome.valid_rows
    );
    for row in outcome.invalid() {
        let _ = writeln!(
            out,
            "  line {}: {}",
            row.source_row_index,
            row.validation_errors.join("; ")
        );
    }
    out
}

/// Imports a file into one school.
pub async fn import_file(
    students: &dyn StudentStore,
    schools: &dyn SchoolStore,
    school_id: SchoolId,
    content: &str,
    options: ImportOptions,
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let school = schools.get(school_id).await?;
    ImportService::import(students, &school, content, options, config).await
}

pub async fn create_school(schools: &dyn SchoolStore, dto: CreateSchoolDto) -> anyhow::Result<School> {
    dto.validate()
        .map_err(|e| anyhow::anyhow!("Invalid school: {}", e))?;
    SchoolService::create_school(schools, &dto)
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))
}

/// Mints an admin JWT for API access.
pub fn issue_token(
    subject: &str,
    role: AdminRole,
    school_id: Option<Uuid>,
    config: &JwtConfig,
) -> anyhow::Result<String> {
    let token = create_admin_token(subject, role, school_id, config)
        .map_err(|e| anyhow::anyhow!(e.message()))?;
    metrics::track_admin_token_issued(role.as_str());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::imports::export::generate_csv_template;
    use crate::modules::students::store::MemoryStore;
    use learnhub_auth::verify_token;

    fn config() -> ImportConfig {
        ImportConfig {
            password_hash_cost: 4,
            ..ImportConfig::default()
        }
    }

    fn school_dto() -> CreateSchoolDto {
        CreateSchoolDto {
            name: "Riverside Public School".to_string(),
            code: "SCH-RPS".to_string(),
            address: None,
        }
    }

    #[test]
    fn test_render_outcome_lists_invalid_lines() {
        let outcome = crate::modules::imports::parser::parse(
            "name,class,mobile\nAsha,5,9876543210\n,5,12\n",
        );
        let text = render_outcome(&outcome);
        assert!(text.starts_with("2 rows, 1 valid, 1 with errors"));
        assert!(text.contains("line 3: Student name is required"));
    }

    #[test]
    fn test_render_outcome_structural() {
        let outcome = crate::modules::imports::parser::parse("name\n");
        assert!(render_outcome(&outcome).starts_with("error: "));
    }

    #[tokio::test]
    async fn test_import_file_into_created_school() {
        let store = MemoryStore::new();
        let school = create_school(&store, school_dto()).await.unwrap();
        let template = generate_csv_template().unwrap();

        let report = import_file(
            &store,
            &store,
            school.id,
            &template,
            ImportOptions::default(),
            &config(),
        )
        .await
        .unwrap();

        assert_eq!(report.imported, 3);
        assert!(report.credentials.iter().all(|c| c.username.starts_with("rps_")));
    }

    #[tokio::test]
    async fn test_import_file_unknown_school() {
        let store = MemoryStore::new();
        let err = import_file(
            &store,
            &store,
            SchoolId::new(),
            "name,class,mobile\nAsha,5,9876543210\n",
            ImportOptions::default(),
            &config(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_create_school_rejects_invalid_code() {
        let store = MemoryStore::new();
        let dto = CreateSchoolDto {
            code: "--".to_string(),
            ..school_dto()
        };
        assert!(create_school(&store, dto).await.is_err());
    }

    #[test]
    fn test_issue_token_round_trip() {
        let jwt = JwtConfig {
            secret: "cli-secret".to_string(),
            access_token_expiry: 60,
        };
        let school_id = Uuid::new_v4();
        let token = issue_token("ops@school.test", AdminRole::SchoolAdmin, Some(school_id), &jwt)
            .unwrap();
        assert_eq!(verify_token(&token, &jwt).unwrap().school_id, Some(school_id));
    }
}
