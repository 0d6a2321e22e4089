//! CSV parsing and row validation for bulk student imports.
//!
//! The parser is deliberately forgiving: it never fails on a malformed row.
//! Problems are attached to the row as human-readable messages so the
//! uploader can fix the file and try again.

use learnhub_models::imports::{ParseOutcome, ParsedStudentRow};
use learnhub_models::value_types::{Email, MobileNumber, ValueTypeError};
use tracing::debug;

pub const EMPTY_FILE_MESSAGE: &str = "CSV file must contain a header row and at least one data row";

/// Canonical import columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    StudentName,
    Class,
    Section,
    MobileNumber,
    Email,
}

impl Column {
    const ALL: [Column; 5] = [
        Column::StudentName,
        Column::Class,
        Column::Section,
        Column::MobileNumber,
        Column::Email,
    ];

    const REQUIRED: [Column; 3] = [Column::StudentName, Column::Class, Column::MobileNumber];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::StudentName => "student_name",
            Column::Class => "class",
            Column::Section => "section",
            Column::MobileNumber => "mobile_number",
            Column::Email => "email",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::StudentName => &["student_name", "name", "student name"],
            Column::Class => &["class", "grade", "standard"],
            Column::Section => &["section", "div", "division"],
            Column::MobileNumber => &[
                "mobile_number",
                "mobile",
                "phone",
                "mobile number",
                "phone number",
            ],
            Column::Email => &["email", "email address", "e-mail"],
        }
    }

    /// Looks up an already trimmed, lowercased header cell.
    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL
            .into_iter()
            .find(|column| column.aliases().contains(&header))
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Maps each canonical column to its position in the file.
#[derive(Debug, Default)]
struct HeaderMap {
    positions: [Option<usize>; 5],
}

impl HeaderMap {
    fn from_cells(cells: &[String]) -> Self {
        let mut map = HeaderMap::default();
        for (position, cell) in cells.iter().enumerate() {
            let key = cell.to_lowercase();
            if let Some(column) = Column::from_header(&key) {
                let slot = &mut map.positions[column.index()];
                // First occurrence wins.
                if slot.is_none() {
                    *slot = Some(position);
                }
            }
        }
        map
    }

    fn missing_required(&self) -> Vec<&'static str> {
        Column::REQUIRED
            .iter()
            .filter(|column| self.positions[column.index()].is_none())
            .map(Column::as_str)
            .collect()
    }

    fn cell<'a>(&self, fields: &'a [String], column: Column) -> &'a str {
        self.positions[column.index()]
            .and_then(|position| fields.get(position))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Splits one line into trimmed fields.
///
/// A `"` toggles quoted mode and is dropped; a comma outside quotes ends the
/// field. Doubled quotes are not treated as an escaped quote.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_row(
    source_row_index: usize,
    student_name: &str,
    class: &str,
    section: &str,
    mobile_raw: &str,
    email_raw: &str,
) -> ParsedStudentRow {
    let mut errors = Vec::new();

    if student_name.trim().is_empty() {
        errors.push("Student name is required".to_string());
    }
    if class.trim().is_empty() {
        errors.push("Class is required".to_string());
    }

    let mobile_number = MobileNumber::normalize(mobile_raw);
    if let Err(e) = MobileNumber::new(&mobile_number) {
        errors.push(e.to_string());
    }

    let email = non_blank(email_raw);
    if email.as_deref().is_some_and(|e| !Email::has_simple_shape(e)) {
        errors.push(ValueTypeError::InvalidEmail.to_string());
    }

    ParsedStudentRow {
        source_row_index,
        student_name: student_name.trim().to_string(),
        class: class.trim().to_string(),
        section: non_blank(section),
        mobile_number,
        email,
        validation_errors: errors,
    }
}

/// Parses an uploaded CSV into validated rows.
///
/// Structural problems (no data rows, missing required headers) produce a
/// single synthetic error row with `total_rows == 0`.
pub fn parse(content: &str) -> ParseOutcome {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let lines: Vec<(usize, &str)> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return ParseOutcome::structural_error(EMPTY_FILE_MESSAGE);
    }

    let (_, header_line) = lines[0];
    let headers = HeaderMap::from_cells(&split_fields(header_line));

    let missing = headers.missing_required();
    if !missing.is_empty() {
        return ParseOutcome::structural_error(format!(
            "Missing required headers: {}",
            missing.join(", ")
        ));
    }

    let rows: Vec<ParsedStudentRow> = lines[1..]
        .iter()
        .map(|(line_number, line)| {
            let fields = split_fields(line);
            validate_row(
                *line_number,
                headers.cell(&fields, Column::StudentName),
                headers.cell(&fields, Column::Class),
                headers.cell(&fields, Column::Section),
                headers.cell(&fields, Column::MobileNumber),
                headers.cell(&fields, Column::Email),
            )
        })
        .collect();

    let outcome = ParseOutcome::from_rows(rows);
    debug!(
        total_rows = outcome.total_rows,
        valid_rows = outcome.valid_rows,
        "Parsed student CSV"
    );
    outcome
}
