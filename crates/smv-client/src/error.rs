//! Error types for remote pipeline calls.

use thiserror::Error;

/// Result type for remote pipeline calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the generation service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl RemoteError {
    /// Create an HTTP error from a status code and response body.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// HTTP status of the failed response, if this was a non-2xx reply.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
