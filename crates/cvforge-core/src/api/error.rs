use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Coarse category of an [`ApiError`], used by consumers to decide between
/// field-level messages, a global message, or a generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server rejected specific fields.
    Validation,
    /// The server explained the failure in a single message.
    Business,
    /// No structured payload: network failures, unexpected statuses, bad bodies.
    Transport,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(FieldErrors),

    #[error("{message}")]
    Business { status: u16, message: String },

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the account service.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    message: Option<String>,
}

fn join_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_message(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let cut = (0..=MAX_ERROR_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
    }

    /// Classify a non-success response.
    ///
    /// Structured bodies win over the status code: `{"errors": {...}}` is a
    /// validation failure and `{"message": "..."}` a business failure. Anything
    /// else is mapped from the status alone.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
                let fields = errors
                    .into_iter()
                    .map(|(field, value)| (field, field_message(value)))
                    .collect();
                return ApiError::Validation(fields);
            }
            if let Some(message) = parsed.message.filter(|m| !m.trim().is_empty()) {
                return ApiError::Business {
                    status: status.as_u16(),
                    message,
                };
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Business { .. } => ErrorKind::Business,
            _ => ErrorKind::Transport,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        }
    }

    /// The server-provided message of a business failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Business { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when the server refused the credentials or the access token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::Business { status: 401, .. }
        )
    }
}
