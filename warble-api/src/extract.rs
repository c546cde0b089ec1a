//! Request extractors that reject with [`ApiError`]
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies. These
//! wrappers route the rejection through `ApiError` so malformed requests get
//! the same error envelope as everything else.

use axum::extract::{FromRequest, FromRequestParts};
use validator::Validate;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Runs derive-based validation and merges in checks the derive can't express
pub fn validate_request<T: Validate>(
    req: &T,
    extra: impl IntoIterator<Item = ValidationErrorDetail>,
) -> ApiResult<()> {
    let mut details = match req.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => match ApiError::from(errors) {
            ApiError::ValidationError(details) => details,
            other => return Err(other),
        },
    };

    details.extend(extra);

    if details.is_empty() {
        Ok(())
    } else {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        Err(ApiError::ValidationError(details))
    }
}

/// Usernames are 3 to 30 ASCII letters, digits or underscores
pub fn check_username(username: &str) -> Option<ValidationErrorDetail> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if (3..=30).contains(&username.len()) && valid_chars {
        None
    } else {
        Some(ValidationErrorDetail::new(
            "username",
            "Username must be 3-30 letters, digits or underscores",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[test]
    fn test_check_username() {
        assert!(check_username("ada_l").is_none());
        assert!(check_username("Ada99").is_none());
        assert!(check_username("ab").is_some());
        assert!(check_username("has space").is_some());
        assert!(check_username("émile").is_some());
        assert!(check_username(&"x".repeat(31)).is_some());
    }

    #[test]
    fn test_validate_request_merges_details() {
        let sample = Sample {
            email: "not-an-email".to_string(),
        };

        match validate_request(&sample, check_username("x")) {
            Err(ApiError::ValidationError(details)) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "username"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_request_passes_clean_input() {
        let sample = Sample {
            email: "ada@example.com".to_string(),
        };
        assert!(validate_request(&sample, None).is_ok());
    }
}
