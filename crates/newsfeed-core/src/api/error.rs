use reqwest::{header::InvalidHeaderValue, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Message used when a rejected login carries no readable reason.
pub const INVALID_CREDENTIALS_FALLBACK: &str = "invalid username or password";

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredentials,
    Unauthorized,
    RequestFailed,
    TransportError,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token cannot be sent as a header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Map a non-success status and its raw body to an error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            _ => ApiError::RequestFailed {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Build the login failure for a rejected response body.
    ///
    /// Uses the server's `message` field when the body is JSON carrying one.
    pub fn invalid_credentials(body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| INVALID_CREDENTIALS_FALLBACK.to_string());
        ApiError::InvalidCredentials(message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::RequestFailed { .. } => ErrorKind::RequestFailed,
            ApiError::Transport(_) | ApiError::InvalidHeader(_) | ApiError::InvalidResponse(_) => {
                ErrorKind::TransportError
            }
        }
    }
}
