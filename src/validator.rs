use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use learnhub_core::errors::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The message of a failed value parse, without the axum prefix, the field
/// path or the position suffix.
fn data_error_message(body_text: &str) -> String {
    let detail = body_text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(body_text);
    let detail = detail
        .rsplit_once(" at line ")
        .map(|(message, _)| message)
        .unwrap_or(detail);
    detail
        .split_once(": ")
        .map(|(_, message)| message)
        .unwrap_or(detail)
        .to_string()
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let error_msg = rejection.body_text();

    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        )),
        JsonRejection::JsonDataError(_) if error_msg.contains("invalid type") => {
            AppError::bad_request(anyhow!("Invalid field type in request"))
        }
        JsonRejection::JsonDataError(_) => {
            AppError::unprocessable(anyhow!("{}", data_error_message(&error_msg)))
        }
        _ => AppError::bad_request(anyhow!("Invalid request body")),
    }
}

/// JSON body extractor that runs `validator` rules before the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_message_strips_decoration() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    mobile_number: Mobile number must be exactly 10 digits (found 3) at line 1 column 27";
        assert_eq!(
            data_error_message(text),
            "Mobile number must be exactly 10 digits (found 3)"
        );
    }

    #[test]
    fn test_data_error_message_without_path() {
        assert_eq!(data_error_message("Invalid email address"), "Invalid email address");
    }
}
