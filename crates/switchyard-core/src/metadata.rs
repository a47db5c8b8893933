//! Message metadata store
//!
//! Correlates an outbound result message id with everything needed to act on
//! it later: the original request, the rendered response, routing decisions
//! and the timing snapshot. Records live for one hour by default.

use crate::metrics::RequestMetrics;
use crate::render::Verbosity;
use crate::routing::{Classification, TierSelection};
use crate::store::{ExpiringStore, Stamped};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchyard_llm::ModelTier;
use tracing::debug;

/// Default retention for metadata records
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Feedback polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// 👍
    Positive,
    /// 👎
    Negative,
}

/// Context of a sent result message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Chat the message was sent to
    pub chat_id: String,
    /// User who made the request
    pub user_id: String,
    /// Original request text
    pub input: String,
    /// Full response body, before verbosity rendering
    pub response: String,
    /// Classifier result
    pub classification: Classification,
    /// Tier selection
    pub selection: TierSelection,
    /// Timing snapshot taken when the message was sent
    pub metrics: RequestMetrics,
    /// Verbosity currently shown
    pub verbosity: Verbosity,
    /// Recorded feedback
    pub feedback: Option<Feedback>,
    /// User asked to redo this request on the deep tier
    pub pending_retry: bool,
}

impl MessageMetadata {
    /// Skill the request was routed to
    #[must_use]
    pub fn skill(&self) -> &str {
        &self.classification.skill
    }

    /// Tier the request ran on
    #[must_use]
    pub fn tier(&self) -> ModelTier {
        self.selection.tier
    }
}

/// Store of [`MessageMetadata`] keyed by outbound message id
#[derive(Debug, Clone)]
pub struct MessageMetadataStore {
    inner: ExpiringStore<MessageMetadata>,
}

impl Default for MessageMetadataStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl MessageMetadataStore {
    /// Create a store with a retention period
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: ExpiringStore::new(retention),
        }
    }

    /// Record metadata for a sent message
    pub fn store(&self, message_id: &str, metadata: MessageMetadata) -> Stamped<MessageMetadata> {
        debug!(message_id, skill = %metadata.skill(), "Storing message metadata");
        self.inner.insert(message_id, metadata)
    }

    /// Look up a live record
    #[must_use]
    pub fn get(&self, message_id: &str) -> Option<Stamped<MessageMetadata>> {
        self.inner.get(message_id)
    }

    /// Merge changes into a live record
    pub fn update<F>(&self, message_id: &str, f: F) -> Option<Stamped<MessageMetadata>>
    where
        F: FnOnce(&mut MessageMetadata),
    {
        self.inner.update(message_id, f)
    }

    /// Forget a record
    pub fn remove(&self, message_id: &str) -> Option<Stamped<MessageMetadata>> {
        self.inner.remove(message_id)
    }

    /// Drop expired records
    pub fn sweep(&self) -> usize {
        let removed = self.inner.sweep();
        if removed > 0 {
            debug!(removed, "Swept expired message metadata");
        }
        removed
    }

    /// Drop records older than `max_age`
    pub fn cleanup(&self, max_age: Duration) -> usize {
        self.inner.cleanup(max_age)
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &ExpiringStore<MessageMetadata> {
        &self.inner
    }
}
