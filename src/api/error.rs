//! Error type shared by every API wrapper

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    RequestFailed { status: StatusCode, message: String },

    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not match the declared type.
    #[error("unexpected response body from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("failed to encode request body")]
    Encode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status for `RequestFailed`, `None` for everything else.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
