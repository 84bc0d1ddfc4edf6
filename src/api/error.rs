//! Errors returned by the API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No active session. Pass --token or run `portfoliox login` first")]
    NoSession,

    /// 401/403 from the backend. The session has already been cleared.
    #[error("Session rejected by the server (HTTP {status}). Please sign in again")]
    Unauthorized { status: u16 },

    #[error("PortfolioX API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to PortfolioX API at {0}. Is the backend running?")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Authorization failures end the session and must not be swallowed.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::NoSession)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
