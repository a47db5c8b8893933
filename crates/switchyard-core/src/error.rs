//! Error types for switchyard-core
//!
//! This module provides error types and user-friendly error formatting.

use switchyard_llm::ErrorKind;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or capability table
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Skill handler failed
    #[error("handler '{skill}' failed: {message}")]
    Handler {
        /// Skill id of the handler
        skill: String,
        /// Failure description
        message: String,
    },

    /// Session persistence failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Outbound transport failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Model backend error
    #[error("backend error: {0}")]
    Backend(#[from] switchyard_llm::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Configuration(msg) => format!("⚙️ Configuration error: {}", msg),
            Error::Handler { skill, .. } => format!("🔧 The {} handler failed.", skill),
            Error::Persistence(_) | Error::Io(_) => "💾 Could not save your session.".to_string(),
            Error::Transport(_) => "📡 Message delivery failed.".to_string(),
            Error::Backend(e) => match e.kind() {
                ErrorKind::Unavailable => "🌐 The model backend is unavailable right now.".to_string(),
                ErrorKind::TimedOut => "⏳ The request took too long and was stopped.".to_string(),
                ErrorKind::Rejected => format!("🤖 The model backend rejected the request: {}", e),
            },
            Error::Serialization(_) | Error::Internal(_) => {
                "❌ Something went wrong on our side.".to_string()
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Backend(e) => match e.kind() {
                ErrorKind::Unavailable => Some(
                    "💡 Check that the model proxy is running, then run `switchyard doctor`."
                        .to_string(),
                ),
                ErrorKind::TimedOut => {
                    Some("💡 Try a shorter request or split it into smaller steps.".to_string())
                }
                ErrorKind::Rejected => {
                    Some("💡 Check the configured model names for each tier.".to_string())
                }
            },
            Error::Configuration(_) => {
                Some("💡 Check config/default.toml or your SWITCHYARD_ environment.".to_string())
            }
            Error::Handler { .. } => Some("💡 Try rephrasing your request.".to_string()),
            _ => None,
        }
    }
}

/// Format an error for display in a chat message
pub fn format_error_for_chat(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_message() {
        let error = Error::from(switchyard_llm::Error::Unavailable("refused".to_string()));

        let msg = error.user_message();
        assert!(msg.contains("unavailable"));
        assert!(error.suggestion().unwrap().contains("doctor"));
    }

    #[test]
    fn test_backend_timeout_message() {
        let error = Error::from(switchyard_llm::Error::Timeout(60_000));

        let output = format_error_for_chat(&error);
        assert!(output.contains("too long"));
        assert!(output.contains("shorter request"));
    }

    #[test]
    fn test_backend_rejected_message() {
        let error = Error::from(switchyard_llm::Error::Rejected {
            status: 404,
            message: "model not found".to_string(),
        });

        let msg = error.user_message();
        assert!(msg.contains("rejected"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let error = Error::Internal("lock poisoned at 0xdeadbeef".to_string());
        assert!(!error.user_message().contains("0xdeadbeef"));
        assert!(error.suggestion().is_none());
    }
}
