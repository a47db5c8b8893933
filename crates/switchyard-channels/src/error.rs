//! Error types for switchyard-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Message parsing error
    #[error("message parsing error: {0}")]
    Parse(String),

    /// Console I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for switchyard_core::Error {
    fn from(e: Error) -> Self {
        switchyard_core::Error::Transport(e.to_string())
    }
}
