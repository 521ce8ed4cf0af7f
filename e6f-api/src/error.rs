use e6f_common::{post::error::PostError, reqwest};
use thiserror::Error;

/// Failures of the underlying HTTP layer, before any status code is known.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection Error: {0}")]
    ConnectionError(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors surfaced to callers of the request queue and the API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a successful response. `status` is `0` when the
    /// transport failed before the server answered.
    #[error("Request to {endpoint} failed with status {status}: {message}")]
    RequestFailed {
        status: u16,
        message: String,
        endpoint: &'static str,
    },

    /// The server answered with a success status but the body isn't what the endpoint
    /// is supposed to return.
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse {
        endpoint: &'static str,
        message: String,
    },

    /// The drain task stopped before delivering the answer.
    #[error("Request queue shut down before answering")]
    QueueClosed,

    #[error("Failed to build request url: {0}")]
    InvalidUrl(String),

    #[error("Failed to decode server response: {0}")]
    JsonSerializeFail(#[from] serde_json::Error),

    #[error("Failed to map post: {0}")]
    PostMapFailure(#[from] PostError),
}

impl ApiError {
    /// HTTP status attached to the failure, if there is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
