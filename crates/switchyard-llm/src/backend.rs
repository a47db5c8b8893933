//! Model backend trait definition
//!
//! This module defines the trait that model backends implement and the
//! request/response types exchanged with them.

use crate::error::Result;
use crate::message::Message;
use std::time::Duration;

/// A single non-streaming completion request
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Backend model name (resolved from the tier)
    pub model: String,
    /// Conversation, oldest first; the last entry is the user's turn
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Deadline for the whole call
    pub timeout: Duration,
}

impl ModelRequest {
    /// Create a request with a default token budget and a 60s deadline
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: 4096,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the token budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Completion result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    /// Concatenated text blocks, in order
    pub content: String,
    /// Model that actually served the request
    pub model: String,
    /// Stop reason reported by the backend
    pub stop_reason: Option<String>,
}

/// Trait for model backends
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Run one completion
    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse>;

    /// Check that the backend is reachable
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}
