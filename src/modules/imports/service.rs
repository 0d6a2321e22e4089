//! The bulk import pipeline.
//!
//! parse -> structural checks -> invalid-row policy -> duplicate checks ->
//! ordinal reservation -> credentials -> hashing -> atomic write -> report.

use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use learnhub_config::ImportConfig;
use learnhub_core::errors::AppError;
use learnhub_core::password::hash_password_with_cost;
use learnhub_models::imports::{ImportRejection, ImportReport, ParseOutcome, ParsedStudentRow};
use learnhub_models::schools::School;
use learnhub_models::students::{NewStudent, StudentCredential, StudentIdentity};
use learnhub_models::value_types::{Email, MobileNumber};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use super::credentials::{Credential, class_key, generate_temp_password, generate_username};
use super::parser::parse;
use crate::metrics;
use crate::modules::students::store::StudentStore;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file could not be read row by row.
    #[error("{0}")]
    Structural(String),

    #[error("CSV file has {found} data rows; the limit is {max}")]
    TooManyRows { max: usize, found: usize },

    #[error("{} of {} rows failed validation", .0.total_rows - .0.valid_rows, .0.total_rows)]
    InvalidRows(ParseOutcome),

    #[error("Duplicate students in file at rows {}", join_rows(.0))]
    DuplicateInBatch(Vec<usize>),

    #[error("{} student(s) already imported for this school: {}", .0.len(), .0.join(", "))]
    AlreadyImported(Vec<String>),

    #[error("Generated username '{0}' is not unique in this batch")]
    UsernameCollision(String),

    #[error("{0}")]
    Store(AppError),
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AppError> for ImportError {
    fn from(err: AppError) -> Self {
        ImportError::Store(err)
    }
}

impl ImportError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Structural(_) | Self::TooManyRows { .. } | Self::InvalidRows(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::DuplicateInBatch(_) | Self::AlreadyImported(_) => StatusCode::CONFLICT,
            Self::UsernameCollision(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => e.status,
        }
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(err) => err.into_response(),
            Self::InvalidRows(outcome) => {
                let body = ImportRejection {
                    error: Self::InvalidRows(outcome.clone()).to_string(),
                    outcome,
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            other => {
                let status = other.status();
                AppError::new(status, anyhow!(other.to_string())).into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Write valid rows and report invalid ones instead of rejecting the file.
    pub skip_invalid: bool,
}

/// A validated row on its way to the writer.
struct PendingStudent<'a> {
    row: &'a ParsedStudentRow,
    mobile_number: MobileNumber,
    email: Option<Email>,
    identity: StudentIdentity,
}

pub struct ImportService;

impl ImportService {
    /// Parses without writing anything.
    #[instrument(skip(content), fields(bytes = content.len()))]
    pub fn preview(content: &str, config: &ImportConfig) -> Result<ParseOutcome, ImportError> {
        let outcome = parse(content);
        metrics::track_rows_parsed(outcome.total_rows, outcome.valid_rows);
        Self::check_structure(&outcome, config)?;
        Ok(outcome)
    }

    fn check_structure(outcome: &ParseOutcome, config: &ImportConfig) -> Result<(), ImportError> {
        if outcome.is_structural_error() {
            let message = outcome
                .rows
                .first()
                .and_then(|r| r.validation_errors.first())
                .cloned()
                .unwrap_or_else(|| "CSV file could not be read".to_string());
            return Err(ImportError::Structural(message));
        }
        if outcome.total_rows > config.max_rows {
            return Err(ImportError::TooManyRows {
                max: config.max_rows,
                found: outcome.total_rows,
            });
        }
        Ok(())
    }

    /// Runs the full pipeline for one school. Nothing is written unless
    /// every accepted row is written.
    #[instrument(skip(store, content, config), fields(school.id = %school.id, bytes = content.len()))]
    pub async fn import(
        store: &dyn StudentStore,
        school: &School,
        content: &str,
        options: ImportOptions,
        config: &ImportConfig,
    ) -> Result<ImportReport, ImportError> {
        let result = Self::run(store, school, content, options, config).await;
        match &result {
            Ok(report) => {
                metrics::track_students_imported(report.imported, report.skipped.len());
                info!(
                    imported = report.imported,
                    skipped = report.skipped.len(),
                    "Student import committed"
                );
            }
            Err(e) => {
                metrics::track_import_failure(e.status().as_u16());
                warn!(error = %e, "Student import rejected");
            }
        }
        result
    }

    async fn run(
        store: &dyn StudentStore,
        school: &School,
        content: &str,
        options: ImportOptions,
        config: &ImportConfig,
    ) -> Result<ImportReport, ImportError> {
        let outcome = Self::preview(content, config)?;

        if outcome.has_errors && !options.skip_invalid {
            return Err(ImportError::InvalidRows(outcome));
        }

        let skipped: Vec<ParsedStudentRow> = outcome.invalid().cloned().collect();
        let pending = Self::pending_students(&outcome)?;
        if pending.is_empty() {
            return Ok(ImportReport {
                imported: 0,
                credentials: Vec::new(),
                skipped,
            });
        }

        Self::reject_batch_duplicates(&pending)?;

        let identities: Vec<StudentIdentity> = pending.iter().map(|p| p.identity.clone()).collect();
        let existing = store.find_existing_identities(school.id, &identities).await?;
        if !existing.is_empty() {
            let names = pending
                .iter()
                .filter(|p| existing.contains(&p.identity))
                .map(|p| format!("{} (row {})", p.row.student_name, p.row.source_row_index))
                .collect();
            return Err(ImportError::AlreadyImported(names));
        }

        let ordinals = Self::reserve_ordinals(store, school, &pending).await?;
        let credentials = Self::generate_credentials(school, &pending, &ordinals)?;

        let cost = config.password_hash_cost;
        let passwords: Vec<String> = credentials.iter().map(|c| c.temp_password.clone()).collect();
        let hashes = tokio::task::spawn_blocking(move || {
            passwords
                .par_iter()
                .map(|p| hash_password_with_cost(p, cost))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| AppError::internal(anyhow!("Password hashing task failed: {}", e)))??;

        let rows: Vec<NewStudent> = pending
            .iter()
            .zip(credentials.iter())
            .zip(hashes)
            .map(|((p, credential), password_hash)| NewStudent {
                school_id: school.id,
                student_name: p.row.student_name.clone(),
                class: p.row.class.clone(),
                section: p.row.section.clone(),
                mobile_number: p.mobile_number.clone(),
                email: p.email.clone(),
                username: credential.username.clone(),
                temp_password: credential.temp_password.clone(),
                password_hash,
                is_active: true,
                is_trial: false,
            })
            .collect();

        // On failure the generated credentials are dropped with `credentials`.
        let inserted = store.insert_batch(rows).await?;

        let passwords_by_username: HashMap<&str, &str> = credentials
            .iter()
            .map(|c| (c.username.as_str(), c.temp_password.as_str()))
            .collect();

        let mut issued = Vec::with_capacity(inserted.len());
        for student in &inserted {
            let temp_password = passwords_by_username
                .get(student.username.as_str())
                .ok_or_else(|| {
                    AppError::internal(anyhow!(
                        "Store returned unknown username '{}'",
                        student.username
                    ))
                })?;
            issued.push(StudentCredential {
                student_id: student.id,
                student_name: student.student_name.clone(),
                class: student.class.clone(),
                section: student.section.clone(),
                username: student.username.clone(),
                temp_password: temp_password.to_string(),
                mobile_number: student.mobile_number.to_string(),
                email: student.email.as_ref().map(|e| e.to_string()),
            });
        }
        issued.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(ImportReport {
            imported: issued.len(),
            credentials: issued,
            skipped,
        })
    }

    fn pending_students<'a>(
        outcome: &'a ParseOutcome,
    ) -> Result<Vec<PendingStudent<'a>>, ImportError> {
        outcome
            .valid()
            .map(|row| -> Result<PendingStudent<'a>, ImportError> {
                let mobile_number = MobileNumber::new(&row.mobile_number)
                    .map_err(|e| AppError::internal(anyhow!("Row {}: {}", row.source_row_index, e)))?;
                let email = row
                    .email
                    .as_deref()
                    .map(Email::new)
                    .transpose()
                    .map_err(|e| AppError::internal(anyhow!("Row {}: {}", row.source_row_index, e)))?;
                Ok(PendingStudent {
                    row,
                    identity: StudentIdentity::new(
                        &row.student_name,
                        &row.class,
                        mobile_number.as_str(),
                    ),
                    mobile_number,
                    email,
                })
            })
            .collect()
    }

    fn reject_batch_duplicates(pending: &[PendingStudent<'_>]) -> Result<(), ImportError> {
        let mut seen: HashSet<&StudentIdentity> = HashSet::new();
        let duplicates: Vec<usize> = pending
            .iter()
            .filter(|p| !seen.insert(&p.identity))
            .map(|p| p.row.source_row_index)
            .collect();

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(ImportError::DuplicateInBatch(duplicates))
        }
    }

    /// One ordinal per pending row, in row order within each class.
    async fn reserve_ordinals(
        store: &dyn StudentStore,
        school: &School,
        pending: &[PendingStudent<'_>],
    ) -> Result<Vec<u32>, ImportError> {
        let keys: Vec<String> = pending.iter().map(|p| class_key(&p.row.class)).collect();

        let mut counts: Vec<(String, u32)> = Vec::new();
        for key in &keys {
            match counts.iter_mut().find(|(k, _)| k == key) {
                Some((_, count)) => *count += 1,
                None => counts.push((key.clone(), 1)),
            }
        }

        let mut next: HashMap<String, u32> = HashMap::with_capacity(counts.len());
        for (key, count) in counts {
            let first = store.reserve_ordinals(school.id, &key, count).await?;
            next.insert(key, first);
        }

        let mut ordinals = Vec::with_capacity(keys.len());
        for key in &keys {
            let slot = next
                .get_mut(key)
                .ok_or_else(|| AppError::internal(anyhow!("No ordinal reserved for class")))?;
            ordinals.push(*slot);
            *slot += 1;
        }
        Ok(ordinals)
    }

    fn generate_credentials(
        school: &School,
        pending: &[PendingStudent<'_>],
        ordinals: &[u32],
    ) -> Result<Vec<Credential>, ImportError> {
        let mut usernames = HashSet::with_capacity(pending.len());
        let mut credentials = Vec::with_capacity(pending.len());

        for (p, ordinal) in pending.iter().zip(ordinals) {
            let username =
                generate_username(&school.code, &p.row.class, &p.row.student_name, *ordinal);
            if !usernames.insert(username.clone()) {
                return Err(ImportError::UsernameCollision(username));
            }
            credentials.push(Credential {
                username,
                temp_password: generate_temp_password(),
            });
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::schools::store::SchoolStore;
    use crate::modules::students::store::MemoryStore;
    use learnhub_models::schools::CreateSchoolDto;

    const HEADER: &str = "student_name,class,section,mobile_number,email";

    fn config() -> ImportConfig {
        ImportConfig {
            password_hash_cost: 4,
            ..ImportConfig::default()
        }
    }

    async fn store_with_school() -> (MemoryStore, School) {
        let store = MemoryStore::new();
        let school = store
            .create(&CreateSchoolDto {
                name: "Greenfield Public School".into(),
                code: "SCH-GPS".into(),
                address: None,
            })
            .await
            .unwrap();
        (store, school)
    }

    fn csv(rows: &[&str]) -> String {
        std::iter::once(HEADER)
            .chain(rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_import_issues_credentials() {
        let (store, school) = store_with_school().await;
        let content = csv(&[
            "Aarav Patel,5,A,9876543210,aarav@example.com",
            "Diya Shah,5,B,9876543211,",
            "Kabir Singh,6,,9876543212,",
        ]);

        let report = ImportService::import(&store, &school, &content, ImportOptions::default(), &config())
            .await
            .unwrap();

        assert_eq!(report.imported, 3);
        assert!(report.skipped.is_empty());
        let usernames: Vec<&str> = report.credentials.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(
            usernames,
            vec!["gps_5_aaravpat_001", "gps_5_diyashah_002", "gps_6_kabirsin_001"]
        );
        for credential in &report.credentials {
            assert_eq!(credential.temp_password.len(), 8);
            assert_eq!(
                store.temp_password_of(&credential.username).as_deref(),
                Some(credential.temp_password.as_str())
            );
        }
    }

    #[tokio::test]
    async fn test_ordinals_continue_across_batches() {
        let (store, school) = store_with_school().await;

        ImportService::import(
            &store,
            &school,
            &csv(&["Aarav Patel,5,A,9876543210,"]),
            ImportOptions::default(),
            &config(),
        )
        .await
        .unwrap();
        let second = ImportService::import(
            &store,
            &school,
            &csv(&["Aarav Patil,5,A,9876500000,"]),
            ImportOptions::default(),
            &config(),
        )
        .await
        .unwrap();

        assert_eq!(second.credentials[0].username, "gps_5_aaravpat_002");
    }

    #[tokio::test]
    async fn test_invalid_rows_reject_by_default() {
        let (store, school) = store_with_school().await;
        let content = csv(&["Aarav Patel,5,A,9876543210,", "Diya Shah,5,B,12345,"]);

        let err = ImportService::import(&store, &school, &content, ImportOptions::default(), &config())
            .await
            .unwrap_err();

        match err {
            ImportError::InvalidRows(outcome) => {
                assert_eq!(outcome.total_rows, 2);
                assert_eq!(outcome.valid_rows, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.student_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_invalid_writes_valid_rows() {
        let (store, school) = store_with_school().await;
        let content = csv(&["Aarav Patel,5,A,9876543210,", "Diya Shah,5,B,12345,"]);

        let report = ImportService::import(
            &store,
            &school,
            &content,
            ImportOptions { skip_invalid: true },
            &config(),
        )
        .await
        .unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].source_row_index, 3);
        assert_eq!(store.student_count(), 1);
    }

    #[tokio::test]
    async fn test_structural_error() {
        let (store, school) = store_with_school().await;
        let err = ImportService::import(
            &store,
            &school,
            "class,section\n5,A",
            ImportOptions { skip_invalid: true },
            &config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.to_string(),
            "Missing required headers: student_name, mobile_number"
        );
    }

    #[tokio::test]
    async fn test_too_many_rows() {
        let (store, school) = store_with_school().await;
        let limited = ImportConfig {
            max_rows: 1,
            ..config()
        };
        let content = csv(&["A,5,A,9876543210,", "B,5,A,9876543211,"]);

        let err = ImportService::import(&store, &school, &content, ImportOptions::default(), &limited)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::TooManyRows { max: 1, found: 2 }));
    }

    #[tokio::test]
    async fn test_reimport_is_conflict() {
        let (store, school) = store_with_school().await;
        let content = csv(&["Aarav Patel,5,A,9876543210,"]);

        let first = ImportService::import(&store, &school, &content, ImportOptions::default(), &config())
            .await
            .unwrap();
        let password = first.credentials[0].temp_password.clone();

        let upper = csv(&["AARAV PATEL,5,A,98765 43210,"]);
        let err = ImportService::import(&store, &school, &upper, ImportOptions::default(), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::AlreadyImported(_)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(store.student_count(), 1);
        assert_eq!(
            store.temp_password_of("gps_5_aaravpat_001").as_deref(),
            Some(password.as_str())
        );
    }

    #[tokio::test]
    async fn test_duplicates_inside_file() {
        let (store, school) = store_with_school().await;
        let content = csv(&[
            "Aarav Patel,5,A,9876543210,",
            "Diya Shah,5,A,9876543211,",
            "aarav patel,5,B,9876543210,",
        ]);

        let err = ImportService::import(&store, &school, &content, ImportOptions::default(), &config())
            .await
            .unwrap_err();

        match err {
            ImportError::DuplicateInBatch(rows) => assert_eq!(rows, vec![4]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_write_failure_writes_nothing() {
        let (store, school) = store_with_school().await;
        store.fail_next_insert();
        let content = csv(&["Aarav Patel,5,A,9876543210,", "Diya Shah,5,A,9876543211,"]);

        let err = ImportService::import(&store, &school, &content, ImportOptions::default(), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Store(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.student_count(), 0);
    }

    #[test]
    fn test_preview_does_not_require_store() {
        let outcome = ImportService::preview(&csv(&["A,5,A,123,"]), &config()).unwrap();
        assert_eq!(outcome.valid_rows, 0);
        assert!(outcome.has_errors);
    }
}
