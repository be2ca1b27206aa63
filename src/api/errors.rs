//! Error types for the backend API client.

use crate::models::EntityKind;

/// Message shown for failures that carry nothing more useful for a user.
pub const GENERIC_LOAD_FAILURE: &str = "Failed to load data, please retry";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("failed to parse response from {url} (HTTP {status})")]
    ParseFailed {
        status: u16,
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("server returned HTTP {status} for {url}")]
    Http {
        status: u16,
        url: String,
        message: Option<String>,
    },
    #[error("server rejected request (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Envelope { status: i64, message: Option<String> },
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("{0} rows cannot be used as references")]
    NotReferable(EntityKind),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(reqwest_middleware::Error::Reqwest(err))
    }
}

impl ApiError {
    /// Text for an inline error banner.
    ///
    /// Envelope and HTTP errors use the server's own message when it sent
    /// one; everything else collapses to a generic retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Envelope {
                message: Some(message),
                ..
            }
            | ApiError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_LOAD_FAILURE.to_owned(),
        }
    }

    /// HTTP or envelope status, when the server produced one.
    pub fn status(&self) -> Option<i64> {
        match self {
            ApiError::ParseFailed { status, .. } | ApiError::Http { status, .. } => {
                Some(i64::from(*status))
            }
            ApiError::Envelope { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
