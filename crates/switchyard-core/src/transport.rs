//! Chat transport boundary
//!
//! The core only needs three outbound operations from a chat platform, plus
//! the shape of the signal events the platform delivers back.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Outbound chat operations
#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send a message, returning its platform id
    async fn send(&self, chat_id: &str, text: &str) -> Result<String>;

    /// Replace the text of a sent message
    async fn edit(&self, chat_id: &str, message_id: &str, text: &str) -> Result<()>;

    /// Offer a set of reaction symbols on a message
    async fn set_reactions(&self, chat_id: &str, message_id: &str, symbols: &[String])
        -> Result<()>;
}

/// Kind of reaction value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Unicode emoji
    Emoji,
    /// Platform custom emoji or anything else
    #[serde(other)]
    Other,
}

/// A reaction value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionValue {
    /// Value kind
    pub kind: ReactionKind,
    /// Symbol or platform identifier
    pub value: String,
}

impl ReactionValue {
    /// An emoji reaction
    #[must_use]
    pub fn emoji(value: impl Into<String>) -> Self {
        Self {
            kind: ReactionKind::Emoji,
            value: value.into(),
        }
    }
}

/// A reaction change delivered by the platform after a message was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Target message
    pub message_id: String,
    /// User who reacted
    pub user_id: String,
    /// Previous reaction, if any
    #[serde(default)]
    pub old_value: Option<ReactionValue>,
    /// New reaction; `None` when a reaction was removed
    #[serde(default)]
    pub new_value: Option<ReactionValue>,
}

impl ReactionEvent {
    /// Event for a newly added emoji
    #[must_use]
    pub fn emoji(
        message_id: impl Into<String>,
        user_id: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            user_id: user_id.into(),
            old_value: None,
            new_value: Some(ReactionValue::emoji(symbol)),
        }
    }
}

/// An outbound operation captured by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `send`
    Sent {
        /// Chat id
        chat_id: String,
        /// Assigned message id
        message_id: String,
        /// Text
        text: String,
    },
    /// `edit`
    Edited {
        /// Chat id
        chat_id: String,
        /// Edited message id
        message_id: String,
        /// New text
        text: String,
    },
    /// `set_reactions`
    Reactions {
        /// Chat id
        chat_id: String,
        /// Target message id
        message_id: String,
        /// Offered symbols
        symbols: Vec<String>,
    },
}

/// Transport that records every operation, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<Outbound>>>,
    next_id: Arc<Mutex<u64>>,
    fail_reactions: bool,
}

impl RecordingTransport {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set_reactions` fail
    #[must_use]
    pub fn with_failing_reactions(mut self) -> Self {
        self.fail_reactions = true;
        self
    }

    /// Everything recorded so far
    #[must_use]
    pub fn outbound(&self) -> Vec<Outbound> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts of sent messages, in order
    #[must_use]
    pub fn sent_texts(&self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Sent { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Id of the most recently sent message
    #[must_use]
    pub fn last_sent_id(&self) -> Option<String> {
        self.outbound().into_iter().rev().find_map(|o| match o {
            Outbound::Sent { message_id, .. } => Some(message_id),
            _ => None,
        })
    }

    fn push(&self, op: Outbound) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }
}

#[async_trait::async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, chat_id: &str, text: &str) -> Result<String> {
        let message_id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            format!("msg-{}", *next)
        };
        self.push(Outbound::Sent {
            chat_id: chat_id.to_string(),
            message_id: message_id.clone(),
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn edit(&self, chat_id: &str, message_id: &str, text: &str) -> Result<()> {
        self.push(Outbound::Edited {
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_reactions(
        &self,
        chat_id: &str,
        message_id: &str,
        symbols: &[String],
    ) -> Result<()> {
        if self.fail_reactions {
            return Err(crate::error::Error::Transport(
                "reactions unsupported".to_string(),
            ));
        }
        self.push(Outbound::Reactions {
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
            symbols: symbols.to_vec(),
        });
        Ok(())
    }
}
