//! Request extractors that reject in the API's error shape.
//!
//! axum's stock `Json`, `Path` and `Query` answer a bad request with a plain
//! text body. These wrappers turn the rejection into an [`AppError`], so a
//! body that fails to deserialize comes back as a 422 with the field serde
//! complained about.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::forms::{FormErrors, REQUIRED};
use crate::routes::INVALID_CHOICE;
use crate::AppError;

/// Key for errors that cannot be pinned on a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";
const INVALID_VALUE: &str = "Enter a valid value.";

static MISSING_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `(\w+)`").expect("missing field pattern is valid"));
static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"target type: ([\w.\[\]]+): (.+?)(?: at line \d+ column \d+)?$")
        .expect("field path pattern is valid")
});
static SERDE_MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"target type: (.+?)(?: at line \d+ column \d+)?$")
        .expect("serde message pattern is valid")
});

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameters. Anything that does not parse is a 404, like a missing row.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Pin a serde deserialization message on the field it names.
fn field_errors(text: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if let Some(caps) = MISSING_FIELD_RE.captures(text) {
        errors.add(&caps[1], REQUIRED);
    } else if let Some(caps) = FIELD_PATH_RE.captures(text) {
        let field = caps[1]
            .rsplit('.')
            .map(|segment| segment.split('[').next().unwrap_or(segment))
            .find(|segment| !segment.is_empty())
            .unwrap_or(NON_FIELD_ERRORS);
        let message = if caps[2].starts_with("unknown variant") {
            INVALID_CHOICE
        } else {
            INVALID_VALUE
        };
        errors.add(field, message);
    } else {
        let message = SERDE_MESSAGE_RE
            .captures(text)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| text.to_string());
        errors.add(NON_FIELD_ERRORS, message);
    }
    errors
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        debug!("Rejected JSON body: {}", text);
        match rejection {
            JsonRejection::JsonDataError(_) => field_errors(&text).into(),
            other => AppError::new(other.status(), text),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection.body_text());
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                AppError::new(StatusCode::NOT_FOUND, "Not found")
            }
            other => AppError::new(other.status(), other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        debug!("Rejected query string: {}", text);
        AppError {
            status_code: rejection.status(),
            message: "Invalid query string".to_string(),
            fields: Some(field_errors(&text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_reported_as_required() {
        let errors = field_errors(
            "Failed to deserialize the JSON body into the target type: \
             missing field `fullName` at line 1 column 28",
        );
        assert_eq!(errors.get("fullName"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn invalid_value_is_pinned_on_the_last_path_segment() {
        let errors = field_errors(
            "Failed to deserialize the JSON body into the target type: \
             duration: invalid value: integer `-5`, expected u32 at line 1 column 17",
        );
        assert_eq!(errors.get("duration"), Some(&[INVALID_VALUE.to_string()][..]));

        let errors = field_errors(
            "Failed to deserialize the JSON body into the target type: \
             gender: unknown variant `X`, expected one of `M`, `F`, `O` at line 1 column 12",
        );
        assert_eq!(errors.get("gender"), Some(&[INVALID_CHOICE.to_string()][..]));
    }

    #[test]
    fn message_without_field_goes_to_non_field_errors() {
        let errors = field_errors(
            "Failed to deserialize query string: unknown variant `everything`, expected `all`",
        );
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(
                &["Failed to deserialize query string: unknown variant `everything`, expected `all`"
                    .to_string()][..]
            )
        );
    }
}
