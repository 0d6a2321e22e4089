//! Models for the CSV bulk student import.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::students::StudentCredential;

/// One data line of an uploaded CSV, after parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParsedStudentRow {
    /// 1-based line number in the uploaded file
    pub source_row_index: usize,
    pub student_name: String,
    pub class: String,
    pub section: Option<String>,
    /// Digits only
    pub mobile_number: String,
    pub email: Option<String>,
    pub validation_errors: Vec<String>,
}

impl ParsedStudentRow {
    /// A row carrying only an error, used for problems with the file as a whole.
    pub fn synthetic_error(message: impl Into<String>) -> Self {
        Self {
            source_row_index: 0,
            student_name: String::new(),
            class: String::new(),
            section: None,
            mobile_number: String::new(),
            email: None,
            validation_errors: vec![message.into()],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParseOutcome {
    pub rows: Vec<ParsedStudentRow>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub has_errors: bool,
}

impl ParseOutcome {
    /// An outcome for a file that could not be read row by row.
    pub fn structural_error(message: impl Into<String>) -> Self {
        Self {
            rows: vec![ParsedStudentRow::synthetic_error(message)],
            total_rows: 0,
            valid_rows: 0,
            has_errors: true,
        }
    }

    pub fn from_rows(rows: Vec<ParsedStudentRow>) -> Self {
        let total_rows = rows.len();
        let valid_rows = rows.iter().filter(|r| r.is_valid()).count();
        Self {
            rows,
            total_rows,
            valid_rows,
            has_errors: valid_rows < total_rows,
        }
    }

    /// True when the file itself was rejected (no data rows were read).
    pub fn is_structural_error(&self) -> bool {
        self.total_rows == 0 && self.has_errors
    }

    pub fn valid(&self) -> impl Iterator<Item = &ParsedStudentRow> {
        self.rows.iter().filter(|r| r.is_valid())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &ParsedStudentRow> {
        self.rows.iter().filter(|r| !r.is_valid())
    }
}

/// Result of a committed import.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub credentials: Vec<StudentCredential>,
    /// Invalid rows left out when `skip_invalid` was requested
    pub skipped: Vec<ParsedStudentRow>,
}

/// Body of a 422 response when rows failed validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportRejection {
    pub error: String,
    pub outcome: ParseOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// Write the valid rows and report the rest instead of rejecting the file
    #[serde(default, deserialize_with = "learnhub_core::serde::deserialize_optional_bool")]
    pub skip_invalid: Option<bool>,
    /// `json` (default) or `csv` for a credentials download
    pub format: Option<ImportFormat>,
    /// Required for system admins
    #[serde(default, deserialize_with = "learnhub_core::serde::deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}
