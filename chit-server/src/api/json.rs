//! JSON body extractor and response wrapper
//!
//! Wraps `axum::Json` so that a body that fails to parse or deserialize is
//! answered with an [`AppError`] (400 plus a field-error map) instead of
//! axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{AppError, ErrorCode};

/// Field key used when an error cannot be tied to a single field
const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_error(rejection)),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            tracing::debug!("Rejected request body: {}", err.body_text());
            data_error(&err.body_text())
        }
        JsonRejection::MissingJsonContentType(err) => {
            AppError::with_message(ErrorCode::InvalidFormat, "Expected an application/json body")
                .with_detail(BODY_FIELD, err.body_text())
        }
        other => AppError::with_message(ErrorCode::InvalidFormat, "Malformed JSON body")
            .with_detail(BODY_FIELD, other.body_text()),
    }
}

/// Well-formed JSON that does not fit the payload type
fn data_error(text: &str) -> AppError {
    let (field, message) = split_serde_error(text);
    let is_status = field.rsplit('.').next() == Some("status");
    if is_status && message.starts_with("unknown variant") {
        return AppError::new(ErrorCode::InvalidPaymentStatus).with_detail(field, message);
    }
    AppError::field(&field, message)
}

/// `(field path, message)` from axum's deserialization error text.
///
/// The text reads `<prefix>: <path>: <serde message> at line L column C`,
/// with no path for errors on the top-level object.
fn split_serde_error(text: &str) -> (String, String) {
    let cause = text
        .split_once("target type: ")
        .map_or(text, |(_, cause)| cause);
    let cause = cause
        .rsplit_once(" at line ")
        .map_or(cause, |(message, _)| message);

    if let Some((field, _)) = cause
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
    {
        return (field.to_string(), "This field is required.".to_string());
    }

    match cause.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (path.to_string(), message.to_string())
        }
        _ => (BODY_FIELD.to_string(), cause.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

    #[test]
    fn missing_field_names_the_field() {
        let (field, message) =
            split_serde_error(&format!("{PREFIX}missing field `total_slots` at line 1 column 42"));
        assert_eq!(field, "total_slots");
        assert_eq!(message, "This field is required.");
    }

    #[test]
    fn nested_path_is_kept() {
        let (field, message) = split_serde_error(&format!(
            "{PREFIX}external_members_data[0].slot_count: \
             invalid type: string \"two\", expected i32 at line 1 column 90"
        ));
        assert_eq!(field, "external_members_data[0].slot_count");
        assert_eq!(message, "invalid type: string \"two\", expected i32");
    }

    #[test]
    fn top_level_errors_fall_back_to_body() {
        let (field, message) = split_serde_error(&format!(
            "{PREFIX}invalid type: sequence, expected struct ChitCreate at line 1 column 0"
        ));
        assert_eq!(field, BODY_FIELD);
        assert_eq!(message, "invalid type: sequence, expected struct ChitCreate");
    }

    #[test]
    fn unknown_status_is_a_payment_status_error() {
        let err = data_error(&format!(
            "{PREFIX}status: unknown variant `refunded`, \
             expected one of `pending`, `paid`, `late` at line 1 column 21"
        ));
        assert_eq!(err.code, ErrorCode::InvalidPaymentStatus);
        assert!(err.details.unwrap().contains_key("status"));

        let err = data_error(&format!(
            "{PREFIX}updates[1].status: unknown variant `void`, \
             expected one of `pending`, `paid`, `late` at line 1 column 60"
        ));
        assert_eq!(err.code, ErrorCode::InvalidPaymentStatus);
    }

    #[test]
    fn other_data_errors_are_validation_failures() {
        let err = data_error(&format!(
            "{PREFIX}total_amount: invalid type: map, expected a Decimal type at line 1 column 30"
        ));
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.details.unwrap().contains_key("total_amount"));
    }
}
