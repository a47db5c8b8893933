//! Message - Normalized inbound events
//!
//! Transports turn platform input into [`InboundEvent`]s: either a text
//! message for the pipeline or a reaction for the reaction controller.
//!
//! The console understands three line shapes:
//!
//! | Line | Event |
//! |------|-------|
//! | `!msg-3 📜` | reaction 📜 on console message `msg-3` |
//! | `{"message_id": ..., "new_value": ...}` | raw reaction event JSON |
//! | anything else | text message |

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use switchyard_core::{ReactionEvent, ReactionValue};
use uuid::Uuid;

use crate::error::{Error, Result};

static REACTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!(msg-\d+)\s+(\S+)\s*$").expect("REACTION_LINE is a compile-time constant")
});

/// Channel type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Local terminal
    Console,
}

impl ChannelType {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized incoming text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Internal id
    pub id: Uuid,
    /// Source channel
    pub channel_type: ChannelType,
    /// Chat the message came from
    pub chat_id: String,
    /// Sender
    pub user_id: String,
    /// Text
    pub text: String,
    /// Arrival time
    pub timestamp: DateTime<Utc>,
}

impl NormalizedMessage {
    /// Create a new message
    #[must_use]
    pub fn new(
        channel_type: ChannelType,
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_type,
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the text is a slash command
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.text.trim_start().starts_with('/')
    }
}

/// Something that arrived from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text message
    Message(NormalizedMessage),
    /// A reaction on an earlier message
    Reaction(ReactionEvent),
}

/// Parse one console line
///
/// Blank lines yield `None`.
pub fn parse_console_line(line: &str, chat_id: &str, user_id: &str) -> Result<Option<InboundEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Some(caps) = REACTION_LINE.captures(trimmed) {
        return Ok(Some(InboundEvent::Reaction(ReactionEvent {
            message_id: caps[1].to_string(),
            user_id: user_id.to_string(),
            old_value: None,
            new_value: Some(ReactionValue::emoji(&caps[2])),
        })));
    }

    if trimmed.starts_with('{') {
        let event: ReactionEvent =
            serde_json::from_str(trimmed).map_err(|e| Error::Parse(e.to_string()))?;
        return Ok(Some(InboundEvent::Reaction(event)));
    }

    Ok(Some(InboundEvent::Message(NormalizedMessage::new(
        ChannelType::Console,
        chat_id,
        user_id,
        trimmed,
    ))))
}
