// ============================
// coachcall-backend-lib/src/validation.rs
// ============================
//! Request field validation.

use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;

// Common validation constants
const MAX_USER_ID_LENGTH: usize = 64;
const MAX_MESSAGE_LENGTH: usize = 4096;

static USER_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

/// Validate a user identity string
pub fn validate_user_id(user_id: &str) -> Result<&str, AppError> {
    if user_id.is_empty() {
        return Err(AppError::Validation(
            "user id must not be empty".to_string(),
        ));
    }

    if user_id.len() > MAX_USER_ID_LENGTH {
        return Err(AppError::Validation(format!(
            "user id must be at most {MAX_USER_ID_LENGTH} characters"
        )));
    }

    if !USER_ID_REGEX.is_match(user_id) {
        return Err(AppError::Validation(
            "user id must contain only alphanumeric characters, hyphens and underscores"
                .to_string(),
        ));
    }

    Ok(user_id)
}

/// Extract a required user-id field from a request body, mapping both a
/// missing field and a malformed value to a 400-class error named after
/// the wire field.
pub fn require_user_id<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    let value = field.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{name} is required")));
    }
    validate_user_id(value).map_err(|_| AppError::Validation(format!("{name} is malformed")))
}

/// Extract a required opaque-id field (call/session ids)
pub fn require_field<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

/// Cap relayed chat payloads
pub fn validate_message(message: &str) -> Result<&str, AppError> {
    if message.len() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_LENGTH} bytes"
        )));
    }
    Ok(message)
}
