//! Error types for the backend API client.

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body.
        message: String,
    },

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the backend rejected the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Error body returned by the backend, `{"error": "...", "details": "..."}`.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error message.
    pub error: String,
    /// Optional detail.
    #[serde(default)]
    pub details: Option<String>,
}

impl ApiErrorResponse {
    /// Message with the detail appended, if any.
    #[must_use]
    pub fn message(&self) -> String {
        match self.details.as_deref().filter(|d| !d.is_empty()) {
            Some(details) => format!("{}: {details}", self.error),
            None => self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 500,
            message: "sheet unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "request failed (500): sheet unavailable");
        assert!(!err.is_unauthorized());

        let err = ApiError::Status {
            status: 401,
            message: "invalid credential".to_string(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_error_body_deserialization() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"error": "invalid credential", "details": "token expired"}"#)
                .expect("deserialize");
        assert_eq!(body.message(), "invalid credential: token expired");

        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"error": "missing customer"}"#).expect("deserialize");
        assert_eq!(body.message(), "missing customer");
    }
}
