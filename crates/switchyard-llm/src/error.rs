//! Error types for switchyard-llm

use thiserror::Error;

/// Backend error type
#[derive(Debug, Error)]
pub enum Error {
    /// Backend not configured
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Backend could not be reached or reported itself unavailable (5xx, 429)
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Request exceeded its deadline
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Backend refused the request (4xx other than 429)
    #[error("rejected by backend ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Sanitized backend message
        message: String,
    },

    /// Response body could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of backend failures, used for user-facing messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or backend down
    Unavailable,
    /// Deadline exceeded
    TimedOut,
    /// Backend answered but refused or produced garbage
    Rejected,
}

impl Error {
    /// Classify this error for user-facing messaging
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured(_) | Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Timeout(_) => ErrorKind::TimedOut,
            Self::Rejected { .. } | Self::InvalidResponse(_) => ErrorKind::Rejected,
        }
    }

    /// Build an error from a reqwest transport failure
    #[must_use]
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else {
            Self::Unavailable(crate::util::sanitize_error_for_user(&err.to_string()))
        }
    }

    /// Build an error from a non-success HTTP status and body
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = crate::util::sanitize_error_for_user(&crate::util::truncate_safe(body, 300));
        match status {
            408 | 504 => Self::Timeout(0),
            429 | 500..=599 => Self::Unavailable(format!("HTTP {}: {}", status, message)),
            _ => Self::Rejected { status, message },
        }
    }
}
