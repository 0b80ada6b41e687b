//! Error types for storefront API calls.

use thiserror::Error;

/// Result type for storefront API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the storefront proxy routes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx response, carrying the message the server put in its error envelope.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

impl ApiError {
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is an access denied error.
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Message suitable for showing next to a failed screen.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}
