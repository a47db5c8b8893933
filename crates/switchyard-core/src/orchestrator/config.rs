//! Orchestrator configuration

use crate::metadata::DEFAULT_RETENTION;
use crate::pending::DEFAULT_PROMPT_TTL;
use crate::routing::tier::DEFAULT_DEEP_THRESHOLD;
use std::time::Duration;

/// An inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorInput {
    /// Chat to reply in
    pub chat_id: String,
    /// Sender
    pub user_id: String,
    /// Message text
    pub text: String,
}

impl OrchestratorInput {
    /// Create a new input
    #[must_use]
    pub fn new(
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// History turns passed to the model
    pub history_turns: usize,
    /// Score at which requests go to the deep tier
    pub deep_threshold: u32,
    /// Lifetime of message metadata
    pub metadata_retention: Duration,
    /// Lifetime of unanswered prompts
    pub prompt_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_turns: 10,
            deep_threshold: DEFAULT_DEEP_THRESHOLD,
            metadata_retention: DEFAULT_RETENTION,
            prompt_ttl: DEFAULT_PROMPT_TTL,
        }
    }
}

impl OrchestratorConfig {
    /// Create a default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history window
    #[must_use]
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Set the deep threshold
    #[must_use]
    pub fn with_deep_threshold(mut self, threshold: u32) -> Self {
        self.deep_threshold = threshold;
        self
    }

    /// Set the metadata retention
    #[must_use]
    pub fn with_metadata_retention(mut self, retention: Duration) -> Self {
        self.metadata_retention = retention;
        self
    }

    /// Set the prompt lifetime
    #[must_use]
    pub fn with_prompt_ttl(mut self, ttl: Duration) -> Self {
        self.prompt_ttl = ttl;
        self
    }
}
