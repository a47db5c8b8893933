//! Inbound message pipeline

use crate::dispatch::{DispatchRequest, Strategy};
use crate::error::Result;
use crate::metadata::MessageMetadata;
use crate::metrics::{Checkpoint, FlowUpdate, RequestMetrics};
use crate::prompt::build_prompt;
use crate::reactions::initial_symbols;
use crate::render::{render, Verbosity};
use switchyard_llm::ModelTier;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::OrchestratorInput;
use super::core::Orchestrator;

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A routed request was answered
    Answered {
        /// Id of the sent result message
        message_id: String,
        /// Skill it was routed to
        skill: String,
        /// Tier it ran on
        tier: ModelTier,
        /// Strategy that produced the answer
        strategy: Strategy,
    },
    /// A session command was handled
    Command {
        /// Id of the reply or prompt message
        message_id: String,
    },
    /// Blank input, nothing sent
    Ignored,
}

impl Orchestrator {
    /// Handle one inbound message end to end
    #[instrument(skip_all, fields(user = %input.user_id, chat = %input.chat_id))]
    pub async fn process(&self, input: &OrchestratorInput) -> Result<MessageOutcome> {
        let text = input.text.trim();
        if text.is_empty() {
            return Ok(MessageOutcome::Ignored);
        }
        if text.starts_with('/') {
            return self.handle_command(input, text).await;
        }

        let mut metrics = RequestMetrics::new(Uuid::new_v4().to_string());
        metrics.mark(Checkpoint::Received);

        let session = self.sessions.get(&input.user_id).await.unwrap_or_default();

        let classification = self.skills.classify(text);
        metrics.mark(Checkpoint::Classified);
        metrics.set_flow(FlowUpdate::Skill(classification.skill.clone()));
        metrics.set_flow(FlowUpdate::Confidence(classification.confidence));

        let selection = self.selector.select(
            text,
            session.turn_count as usize,
            session.tier_override(),
        );
        metrics.mark(Checkpoint::TierChosen);
        metrics.set_flow(FlowUpdate::Tier(selection.tier));
        metrics.set_flow(FlowUpdate::Complexity(selection.score));

        let prompt = build_prompt(&classification.skill, text);
        metrics.mark(Checkpoint::PromptBuilt);

        debug!(
            skill = %classification.skill,
            confidence = classification.confidence,
            tier = %selection.tier,
            score = selection.score,
            "Request routed"
        );

        let request = DispatchRequest {
            user_id: input.user_id.clone(),
            skill: classification.skill.clone(),
            input: text.to_string(),
            prompt,
            tier: selection.tier,
            history: session.recent_history(self.config.history_turns),
        };

        metrics.mark(Checkpoint::ExecutionStart);
        let outcome = self.dispatcher.dispatch(&request, &mut metrics).await;
        metrics.mark(Checkpoint::ExecutionEnd);

        metrics.mark(Checkpoint::FormatStart);
        let mut metadata = MessageMetadata {
            chat_id: input.chat_id.clone(),
            user_id: input.user_id.clone(),
            input: text.to_string(),
            response: outcome.text.clone(),
            classification,
            selection,
            metrics: metrics.clone(),
            verbosity: Verbosity::default(),
            feedback: None,
            pending_retry: false,
        };
        let rendered = render(&metadata, metadata.verbosity);
        metrics.mark(Checkpoint::FormatEnd);

        let message_id = self
            .transport
            .send(&input.chat_id, &rendered)
            .await?;
        metrics.mark(Checkpoint::ResponseSent);

        metadata.metrics = metrics.clone();
        let skill = metadata.skill().to_string();
        let tier = metadata.tier();
        let verbosity = metadata.verbosity;

        self.prompts.discard(&message_id);
        self.metadata.store(&message_id, metadata);
        if let Err(e) = self
            .transport
            .set_reactions(&input.chat_id, &message_id, &initial_symbols(verbosity))
            .await
        {
            debug!(error = %e, "Could not offer reactions");
        }

        if outcome.is_error() {
            warn!(summary = %metrics.summary(), "Request failed");
        } else {
            self.sessions
                .record_answer(&input.user_id, text, &outcome.text, &skill)
                .await;
            info!(summary = %metrics.summary(), "Request answered");
        }

        Ok(MessageOutcome::Answered {
            message_id,
            skill,
            tier,
            strategy: outcome.strategy,
        })
    }
}
