//! # Client Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Transport      │  │   HTTP status   │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Transport      │  │  Unauthorized   │  │  Rejected               │ │
//! │  │  Timeout        │  │  NotFound       │  │  InvalidResponse        │ │
//! │  │                 │  │  Status         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Config: the client could not be built (bad base URL, TLS setup)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant raised by a request carries the URL it was sent to.

use thiserror::Error;

/// Result type alias for commerce API calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Commerce API call failure.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the server (DNS, connection refused, TLS, ...).
    #[error("Network error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// No response within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // =========================================================================
    // HTTP Status Errors
    // =========================================================================
    /// 401 or 403.
    #[error("Unauthorized: {url}")]
    Unauthorized { url: String },

    /// 404.
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Any other non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// 2xx response whose envelope says `success: false`.
    #[error("Request to {url} was rejected: {message}")]
    Rejected { url: String, message: String },

    /// Body could not be decoded.
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Classifies a reqwest failure for the given request URL.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            ClientError::InvalidResponse {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            ClientError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// URL of the failed request, if one was sent.
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::Transport { url, .. }
            | ClientError::Timeout { url }
            | ClientError::Unauthorized { url }
            | ClientError::NotFound { url }
            | ClientError::Status { url, .. }
            | ClientError::Rejected { url, .. }
            | ClientError::InvalidResponse { url, .. } => Some(url),
            ClientError::Config(_) => None,
        }
    }

    /// True when the server never answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. } | ClientError::Timeout { .. })
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid base URL: {}", err))
    }
}
