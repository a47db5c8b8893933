//! Pending multi-option prompts
//!
//! A prompt message offers a fixed set of signals, each tied to an action. The
//! first matching signal consumes the prompt; later signals find nothing.

use crate::store::ExpiringStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default lifetime for an unanswered prompt
pub const DEFAULT_PROMPT_TTL: Duration = Duration::from_secs(5 * 60);

/// One selectable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOption {
    /// Signal that selects this option
    pub signal: String,
    /// Action name reported when selected
    pub action: String,
}

impl PromptOption {
    /// Create an option
    #[must_use]
    pub fn new(signal: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            action: action.into(),
        }
    }
}

/// A question waiting for an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPrompt {
    /// User the prompt belongs to
    pub user_id: String,
    /// Chat the prompt was sent to
    pub chat_id: String,
    /// Question text
    pub question: String,
    /// Available options
    pub options: Vec<PromptOption>,
}

impl PendingPrompt {
    /// Signals offered by this prompt
    #[must_use]
    pub fn signals(&self) -> Vec<String> {
        self.options.iter().map(|o| o.signal.clone()).collect()
    }

    fn option_for(&self, signal: &str) -> Option<&PromptOption> {
        self.options.iter().find(|o| o.signal == signal)
    }
}

/// A prompt resolved by a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    /// The consumed prompt
    pub prompt: PendingPrompt,
    /// Action of the chosen option
    pub action: String,
}

/// Store of [`PendingPrompt`] keyed by prompt message id
#[derive(Debug, Clone)]
pub struct PendingPromptStore {
    inner: ExpiringStore<PendingPrompt>,
}

impl Default for PendingPromptStore {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TTL)
    }
}

impl PendingPromptStore {
    /// Create a store with a prompt lifetime
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: ExpiringStore::new(ttl),
        }
    }

    /// Register a prompt
    pub fn register(&self, message_id: &str, prompt: PendingPrompt) {
        debug!(message_id, options = prompt.options.len(), "Registering pending prompt");
        self.inner.insert(message_id, prompt);
    }

    /// Whether a live prompt exists for a message
    #[must_use]
    pub fn contains(&self, message_id: &str) -> bool {
        self.inner.contains(message_id)
    }

    /// Consume the prompt if `user_id` asked it and `signal` matches one of
    /// its options
    ///
    /// Anything else leaves the prompt in place.
    pub fn resolve(&self, message_id: &str, user_id: &str, signal: &str) -> Option<ResolvedPrompt> {
        let taken = self.inner.take_if(message_id, |prompt| {
            prompt.user_id == user_id && prompt.option_for(signal).is_some()
        })?;
        let action = taken.value.option_for(signal)?.action.clone();
        Some(ResolvedPrompt {
            prompt: taken.value,
            action,
        })
    }

    /// Discard a prompt
    pub fn discard(&self, message_id: &str) -> bool {
        self.inner.remove(message_id).is_some()
    }

    /// Drop expired prompts
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Number of stored prompts
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
