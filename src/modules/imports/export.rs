//! CSV downloads: the blank import template and the credentials sheet.

use anyhow::Context;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use learnhub_models::students::StudentCredential;

pub const TEMPLATE_HEADER: &str = "student_name,class,section,mobile_number,email";

pub const CREDENTIALS_HEADER: [&str; 7] = [
    "Student Name",
    "Class",
    "Section",
    "Username",
    "Password",
    "Mobile",
    "Email",
];

const TEMPLATE_ROWS: [[&str; 5]; 3] = [
    ["Aarav Patel", "5", "A", "9876543210", "aarav.patel@example.com"],
    ["Diya Sharma", "5", "B", "9876543211", ""],
    ["Kabir Singh", "6", "", "9876543212", "kabir.singh@example.com"],
];

fn write_quoted<I, R>(header: Option<&[&str]>, rows: I) -> anyhow::Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// A ready-to-fill import file with three sample rows.
pub fn generate_csv_template() -> anyhow::Result<String> {
    let rows = write_quoted(None, TEMPLATE_ROWS)?;
    Ok(format!("{}\n{}", TEMPLATE_HEADER, rows))
}

/// One quoted row per imported student, for printing and distribution.
pub fn export_credentials_to_csv(credentials: &[StudentCredential]) -> anyhow::Result<String> {
    let rows = credentials.iter().map(|c| {
        [
            c.student_name.as_str(),
            c.class.as_str(),
            c.section.as_deref().unwrap_or(""),
            c.username.as_str(),
            c.temp_password.as_str(),
            c.mobile_number.as_str(),
            c.email.as_deref().unwrap_or(""),
        ]
    });
    write_quoted(Some(&CREDENTIALS_HEADER[..]), rows)
}

/// Wraps CSV text in an attachment response.
pub fn download_csv(filename: &str, content: String) -> Response {
    let safe_name: String = filename
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();

    (
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_name),
            ),
        ],
        content,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::imports::parser::parse;
    use learnhub_models::ids::StudentId;

    fn credential(name: &str, section: Option<&str>, email: Option<&str>) -> StudentCredential {
        StudentCredential {
            student_id: StudentId::new(),
            student_name: name.to_string(),
            class: "5".to_string(),
            section: section.map(str::to_string),
            username: "gps_5_aarav_001".to_string(),
            temp_password: "Hk7pQ2xz".to_string(),
            mobile_number: "9876543210".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_template_starts_with_header() {
        let template = generate_csv_template().unwrap();
        let mut lines = template.lines();
        assert_eq!(lines.next(), Some(TEMPLATE_HEADER));
        assert_eq!(
            lines.next(),
            Some(r#""Aarav Patel","5","A","9876543210","aarav.patel@example.com""#)
        );
        assert_eq!(template.lines().count(), 4);
    }

    #[test]
    fn test_template_round_trips_through_parser() {
        let outcome = parse(&generate_csv_template().unwrap());
        assert!(!outcome.has_errors);
        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.valid_rows, 3);
    }

    #[test]
    fn test_credentials_csv_is_fully_quoted() {
        let csv = export_credentials_to_csv(&[credential("Aarav", Some("A"), None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            r#""Student Name","Class","Section","Username","Password","Mobile","Email""#
        );
        assert_eq!(
            lines[1],
            r#""Aarav","5","A","gps_5_aarav_001","Hk7pQ2xz","9876543210","""#
        );
    }

    #[test]
    fn test_credentials_csv_escapes_quotes_and_commas() {
        let csv =
            export_credentials_to_csv(&[credential(r#"Doe, "JJ" Jane"#, None, Some("j@x.com"))])
                .unwrap();
        assert!(csv.contains(r#""Doe, ""JJ"" Jane""#));
    }

    #[test]
    fn test_empty_credentials_only_header() {
        let csv = export_credentials_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_download_headers() {
        let response = download_csv("students\"\n.csv", "a,b\n".to_string());
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv;charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"students.csv\""
        );
    }
}
