//! Reaction controller
//!
//! Consumes reaction events that arrive after a message was sent and turns
//! them into effects on that message:
//!
//! | Symbol | Effect |
//! |--------|--------|
//! | 🤐 💬 📜 | Re-render at minimal/medium/full and edit in place |
//! | 🔄 | Mark for a deep-tier retry (the user resends) |
//! | ❓ | Explain the routing decision |
//! | 📊 | Show the timing breakdown |
//! | 👍 👎 | Record feedback |
//!
//! Events aimed at a pending prompt consume it once and report the chosen
//! action. Unknown symbols, non-emoji values and unknown messages are ignored.
//! Handling never fails; transport errors are logged and swallowed.

use crate::metadata::{Feedback, MessageMetadata, MessageMetadataStore};
use crate::pending::{PendingPrompt, PendingPromptStore};
use crate::render::{render, Verbosity};
use crate::transport::{MessageTransport, ReactionEvent, ReactionKind};
use std::sync::Arc;
use switchyard_llm::ModelTier;
use tracing::{debug, info, instrument, warn};

/// Action symbols offered on every result message
pub const ACTION_SYMBOLS: [&str; 5] = ["🔄", "❓", "📊", "👍", "👎"];

/// A recognized reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Change verbosity
    Verbosity(Verbosity),
    /// Retry on the deep tier
    Retry,
    /// Explain routing
    Explain,
    /// Show timings
    Metrics,
    /// Feedback
    Feedback(Feedback),
}

impl Signal {
    /// Map a symbol to a signal
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if let Some(level) = Verbosity::from_symbol(symbol) {
            return Some(Self::Verbosity(level));
        }
        match symbol {
            "🔄" => Some(Self::Retry),
            "❓" => Some(Self::Explain),
            "📊" => Some(Self::Metrics),
            "👍" => Some(Self::Feedback(Feedback::Positive)),
            "👎" => Some(Self::Feedback(Feedback::Negative)),
            _ => None,
        }
    }
}

/// Why an event had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Reaction removed
    Removed,
    /// Not a unicode emoji
    NotEmoji,
    /// Symbol has no meaning here
    UnknownSymbol,
    /// No live metadata for the message
    UnknownMessage,
    /// The transport refused the edit
    TransportFailed,
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionOutcome {
    /// Nothing happened
    Ignored(IgnoreReason),
    /// A pending prompt was answered
    PromptResolved {
        /// Prompt message id
        message_id: String,
        /// Chosen action
        action: String,
        /// The consumed prompt
        prompt: PendingPrompt,
    },
    /// The message was re-rendered
    VerbosityChanged {
        /// Previous level
        from: Verbosity,
        /// New level
        to: Verbosity,
    },
    /// The message is already at the requested level
    VerbosityUnchanged(Verbosity),
    /// Request marked for a deep retry
    RetryRequested,
    /// Request already ran deep
    RetryNotNeeded(ModelTier),
    /// Routing explanation sent
    Explained,
    /// Timing breakdown sent
    MetricsShown,
    /// Feedback stored
    FeedbackRecorded(Feedback),
}

/// Applies reaction events to sent messages
#[derive(Clone)]
pub struct ReactionController {
    metadata: MessageMetadataStore,
    prompts: PendingPromptStore,
    transport: Arc<dyn MessageTransport>,
}

impl ReactionController {
    /// Create a controller
    #[must_use]
    pub fn new(
        metadata: MessageMetadataStore,
        prompts: PendingPromptStore,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            metadata,
            prompts,
            transport,
        }
    }

    /// Handle one event
    #[instrument(skip_all, fields(message_id = %event.message_id, user = %event.user_id))]
    pub async fn handle(&self, event: &ReactionEvent) -> ReactionOutcome {
        let Some(value) = &event.new_value else {
            return ReactionOutcome::Ignored(IgnoreReason::Removed);
        };
        if value.kind != ReactionKind::Emoji {
            return ReactionOutcome::Ignored(IgnoreReason::NotEmoji);
        }
        let symbol = value.value.as_str();

        if let Some(resolved) = self.prompts.resolve(&event.message_id, &event.user_id, symbol) {
            info!(action = %resolved.action, "Pending prompt resolved");
            return ReactionOutcome::PromptResolved {
                message_id: event.message_id.clone(),
                action: resolved.action,
                prompt: resolved.prompt,
            };
        }

        let Some(signal) = Signal::from_symbol(symbol) else {
            debug!(symbol, "Ignoring unknown reaction");
            return ReactionOutcome::Ignored(IgnoreReason::UnknownSymbol);
        };

        let Some(stamped) = self.metadata.get(&event.message_id) else {
            debug!("No metadata for reacted message");
            return ReactionOutcome::Ignored(IgnoreReason::UnknownMessage);
        };
        let metadata = stamped.value;

        match signal {
            Signal::Verbosity(level) => self.change_verbosity(&event.message_id, &metadata, level).await,
            Signal::Retry => self.request_retry(&event.message_id, &metadata).await,
            Signal::Explain => {
                self.reply(&metadata, &explain(&metadata)).await;
                ReactionOutcome::Explained
            }
            Signal::Metrics => {
                self.reply(&metadata, &metadata.metrics.breakdown().render()).await;
                ReactionOutcome::MetricsShown
            }
            Signal::Feedback(feedback) => {
                self.record_feedback(&event.message_id, &metadata, feedback).await
            }
        }
    }

    async fn change_verbosity(
        &self,
        message_id: &str,
        metadata: &MessageMetadata,
        level: Verbosity,
    ) -> ReactionOutcome {
        if metadata.verbosity == level {
            return ReactionOutcome::VerbosityUnchanged(level);
        }

        let text = render(metadata, level);
        if let Err(e) = self.transport.edit(&metadata.chat_id, message_id, &text).await {
            warn!(error = %e, "Failed to edit message for verbosity change");
            return ReactionOutcome::Ignored(IgnoreReason::TransportFailed);
        }

        self.metadata.update(message_id, |m| m.verbosity = level);
        self.offer(&metadata.chat_id, message_id, &initial_symbols(level))
            .await;

        info!(from = %metadata.verbosity, to = %level, "Verbosity changed");
        ReactionOutcome::VerbosityChanged {
            from: metadata.verbosity,
            to: level,
        }
    }

    async fn request_retry(&self, message_id: &str, metadata: &MessageMetadata) -> ReactionOutcome {
        let tier = metadata.tier();
        if tier >= ModelTier::Deep {
            self.reply(
                metadata,
                &format!("🔄 This answer already used the {} tier.", tier),
            )
            .await;
            return ReactionOutcome::RetryNotNeeded(tier);
        }

        self.metadata.update(message_id, |m| m.pending_retry = true);
        self.reply(
            metadata,
            "🔄 Noted. Send `/tier deep` and then resend your request to get a deeper answer.",
        )
        .await;
        ReactionOutcome::RetryRequested
    }

    async fn record_feedback(
        &self,
        message_id: &str,
        metadata: &MessageMetadata,
        feedback: Feedback,
    ) -> ReactionOutcome {
        self.metadata.update(message_id, |m| m.feedback = Some(feedback));
        info!(?feedback, skill = %metadata.skill(), tier = %metadata.tier(), "Feedback recorded");

        let ack = match feedback {
            Feedback::Positive => "👍 Thanks for the feedback!".to_string(),
            Feedback::Negative if metadata.tier() < ModelTier::Deep => {
                "👎 Sorry about that. React with 🔄 to try again on the deep tier.".to_string()
            }
            Feedback::Negative => "👎 Sorry about that. Try rephrasing your request.".to_string(),
        };
        self.reply(metadata, &ack).await;
        ReactionOutcome::FeedbackRecorded(feedback)
    }

    async fn reply(&self, metadata: &MessageMetadata, text: &str) {
        if let Err(e) = self.transport.send(&metadata.chat_id, text).await {
            warn!(error = %e, "Failed to send reaction reply");
        }
    }

    async fn offer(&self, chat_id: &str, message_id: &str, symbols: &[String]) {
        if let Err(e) = self
            .transport
            .set_reactions(chat_id, message_id, symbols)
            .await
        {
            debug!(error = %e, "Could not offer reactions");
        }
    }
}

/// Symbols offered on a freshly sent result
#[must_use]
pub fn initial_symbols(verbosity: Verbosity) -> Vec<String> {
    verbosity
        .alternatives()
        .into_iter()
        .chain(ACTION_SYMBOLS)
        .map(str::to_string)
        .collect()
}

fn explain(metadata: &MessageMetadata) -> String {
    let classification = &metadata.classification;
    let selection = &metadata.selection;

    let matched = if classification.matched_keywords.is_empty() {
        "no keywords matched".to_string()
    } else {
        format!("matched: {}", classification.matched_keywords.join(", "))
    };
    let tier_reason = if selection.overridden {
        "set by /tier override".to_string()
    } else if selection.reasons.is_empty() {
        format!("complexity {}", selection.score)
    } else {
        format!("complexity {}: {}", selection.score, selection.reasons.join(", "))
    };

    format!(
        "❓ Why this answer\nSkill: {} (confidence {:.2}, {})\nTier: {} ({})",
        classification.skill, classification.confidence, matched, selection.tier, tier_reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tests::sample_metadata;
    use crate::pending::PromptOption;
    use crate::transport::{Outbound, ReactionValue, RecordingTransport};
    use crate::routing::TierSelection;

    fn setup() -> (ReactionController, MessageMetadataStore, PendingPromptStore, RecordingTransport) {
        let metadata = MessageMetadataStore::default();
        let prompts = PendingPromptStore::default();
        let transport = RecordingTransport::new();
        let controller =
            ReactionController::new(metadata.clone(), prompts.clone(), Arc::new(transport.clone()));
        (controller, metadata, prompts, transport)
    }

    fn long_response() -> String {
        format!("Short answer.\n\n{}", "More detail. ".repeat(40))
    }

    #[tokio::test]
    async fn test_minimal_from_medium() {
        let (controller, metadata, _, transport) = setup();
        metadata.store("m1", sample_metadata(&long_response()));
        let medium_len = render(&sample_metadata(&long_response()), Verbosity::Medium)
            .chars()
            .count();

        let outcome = controller.handle(&ReactionEvent::emoji("m1", "user-1", "🤐")).await;
        assert_eq!(
            outcome,
            ReactionOutcome::VerbosityChanged {
                from: Verbosity::Medium,
                to: Verbosity::Minimal
            }
        );

        let ops = transport.outbound();
        match &ops[0] {
            Outbound::Edited { message_id, text, .. } => {
                assert_eq!(message_id, "m1");
                assert!(text.chars().count() < medium_len);
            }
            other => panic!("expected edit, got {other:?}"),
        }
        match &ops[1] {
            Outbound::Reactions { symbols, .. } => {
                assert_eq!(&symbols[..2], &["💬".to_string(), "📜".to_string()]);
                for action in ACTION_SYMBOLS {
                    assert!(symbols.iter().any(|s| s == action), "{action} not offered");
                }
                assert!(!symbols.iter().any(|s| s == "🤐"));
            }
            other => panic!("expected reactions, got {other:?}"),
        }
        assert_eq!(metadata.get("m1").unwrap().value.verbosity, Verbosity::Minimal);
    }

    #[tokio::test]
    async fn test_duplicate_verbosity_is_idempotent() {
        let (controller, metadata, _, transport) = setup();
        metadata.store("m1", sample_metadata(&long_response()));

        let event = ReactionEvent::emoji("m1", "user-1", "📜");
        controller.handle(&event).await;
        let after_first = (metadata.get("m1").unwrap().value, transport.outbound().len());
        let second = controller.handle(&event).await;

        assert_eq!(second, ReactionOutcome::VerbosityUnchanged(Verbosity::Full));
        assert_eq!(metadata.get("m1").unwrap().value, after_first.0);
        assert_eq!(transport.outbound().len(), after_first.1);
    }

    #[tokio::test]
    async fn test_unknown_inputs_are_noops() {
        let (controller, metadata, _, transport) = setup();
        metadata.store("m1", sample_metadata("body"));

        assert_eq!(
            controller.handle(&ReactionEvent::emoji("m1", "u", "🦀")).await,
            ReactionOutcome::Ignored(IgnoreReason::UnknownSymbol)
        );
        assert_eq!(
            controller.handle(&ReactionEvent::emoji("missing", "u", "📜")).await,
            ReactionOutcome::Ignored(IgnoreReason::UnknownMessage)
        );
        let custom = ReactionEvent {
            message_id: "m1".to_string(),
            user_id: "u".to_string(),
            old_value: None,
            new_value: Some(ReactionValue {
                kind: ReactionKind::Other,
                value: "📜".to_string(),
            }),
        };
        assert_eq!(
            controller.handle(&custom).await,
            ReactionOutcome::Ignored(IgnoreReason::NotEmoji)
        );
        let removed = ReactionEvent {
            new_value: None,
            ..custom
        };
        assert_eq!(
            controller.handle(&removed).await,
            ReactionOutcome::Ignored(IgnoreReason::Removed)
        );
        assert!(transport.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_retry_on_fast_sets_flag() {
        let (controller, metadata, _, transport) = setup();
        let mut record = sample_metadata("body");
        record.selection = TierSelection {
            tier: ModelTier::Fast,
            score: 0,
            reasons: vec![],
            overridden: false,
        };
        metadata.store("m1", record);

        let outcome = controller.handle(&ReactionEvent::emoji("m1", "u", "🔄")).await;
        assert_eq!(outcome, ReactionOutcome::RetryRequested);
        assert!(metadata.get("m1").unwrap().value.pending_retry);
        assert!(transport.sent_texts()[0].contains("resend"));
    }

    #[tokio::test]
    async fn test_retry_on_deep_is_noop() {
        let (controller, metadata, _, _) = setup();
        metadata.store("m1", sample_metadata("body"));

        let outcome = controller.handle(&ReactionEvent::emoji("m1", "u", "🔄")).await;
        assert_eq!(outcome, ReactionOutcome::RetryNotNeeded(ModelTier::Deep));
        assert!(!metadata.get("m1").unwrap().value.pending_retry);
    }

    #[tokio::test]
    async fn test_explain_and_metrics() {
        let (controller, metadata, _, transport) = setup();
        metadata.store("m1", sample_metadata("body"));

        assert_eq!(
            controller.handle(&ReactionEvent::emoji("m1", "u", "❓")).await,
            ReactionOutcome::Explained
        );
        assert_eq!(
            controller.handle(&ReactionEvent::emoji("m1", "u", "📊")).await,
            ReactionOutcome::MetricsShown
        );

        let texts = transport.sent_texts();
        assert!(texts[0].contains("pr-review"));
        assert!(texts[0].contains("complexity 5: analysis, architecture"));
        assert!(texts[1].starts_with("📊 Timing breakdown"));
    }

    #[tokio::test]
    async fn test_feedback() {
        let (controller, metadata, _, transport) = setup();
        metadata.store("m1", sample_metadata("body"));

        let outcome = controller.handle(&ReactionEvent::emoji("m1", "u", "👎")).await;
        assert_eq!(outcome, ReactionOutcome::FeedbackRecorded(Feedback::Negative));
        assert_eq!(
            metadata.get("m1").unwrap().value.feedback,
            Some(Feedback::Negative)
        );
        assert!(transport.sent_texts()[0].starts_with("👎"));
    }

    #[tokio::test]
    async fn test_prompt_consumed_once() {
        let (controller, _, prompts, _) = setup();
        prompts.register(
            "p1",
            PendingPrompt {
                user_id: "u".to_string(),
                chat_id: "c".to_string(),
                question: "Reset?".to_string(),
                options: vec![
                    PromptOption::new("✅", "confirm_reset"),
                    PromptOption::new("❌", "cancel"),
                ],
            },
        );

        match controller.handle(&ReactionEvent::emoji("p1", "u", "✅")).await {
            ReactionOutcome::PromptResolved { action, .. } => assert_eq!(action, "confirm_reset"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            controller.handle(&ReactionEvent::emoji("p1", "u", "✅")).await,
            ReactionOutcome::Ignored(IgnoreReason::UnknownSymbol)
        );
    }

    #[tokio::test]
    async fn test_prompt_only_resolved_by_its_owner() {
        let (controller, _, prompts, _) = setup();
        prompts.register(
            "p1",
            PendingPrompt {
                user_id: "owner".to_string(),
                chat_id: "c".to_string(),
                question: "Reset?".to_string(),
                options: vec![PromptOption::new("✅", "confirm_reset")],
            },
        );

        let stranger = controller.handle(&ReactionEvent::emoji("p1", "someone-else", "✅")).await;
        assert!(!matches!(stranger, ReactionOutcome::PromptResolved { .. }));
        assert!(prompts.contains("p1"));

        let owner = controller.handle(&ReactionEvent::emoji("p1", "owner", "✅")).await;
        assert!(matches!(owner, ReactionOutcome::PromptResolved { .. }));
    }

    #[tokio::test]
    async fn test_reaction_failure_is_swallowed() {
        let metadata = MessageMetadataStore::default();
        let transport = RecordingTransport::new().with_failing_reactions();
        let controller = ReactionController::new(
            metadata.clone(),
            PendingPromptStore::default(),
            Arc::new(transport),
        );
        metadata.store("m1", sample_metadata("body"));

        let outcome = controller.handle(&ReactionEvent::emoji("m1", "u", "📜")).await;
        assert!(matches!(outcome, ReactionOutcome::VerbosityChanged { .. }));
    }

    #[test]
    fn test_initial_symbols() {
        let symbols = initial_symbols(Verbosity::Medium);
        assert_eq!(symbols.len(), 7);
        assert_eq!(&symbols[..2], &["🤐".to_string(), "📜".to_string()]);
    }
}
