//! Session commands and prompt follow-ups
//!
//! - `/reset` asks for confirmation with a ✅/❌ prompt, then deletes history
//! - `/tier fast|deep|premium|auto` sets or clears the tier override

use crate::error::Result;
use crate::pending::{PendingPrompt, PromptOption};
use crate::reactions::ReactionOutcome;
use crate::session::TIER_OVERRIDE_KEY;
use crate::transport::ReactionEvent;
use switchyard_llm::ModelTier;
use tracing::{info, instrument, warn};

use super::config::OrchestratorInput;
use super::core::Orchestrator;
use super::process::MessageOutcome;

const ACTION_CONFIRM_RESET: &str = "confirm_reset";
const ACTION_CANCEL: &str = "cancel";

const HELP_TEXT: &str = "Commands:\n\
/reset - forget this conversation\n\
/tier fast|deep|premium|auto - pin or unpin the execution tier";

impl Orchestrator {
    pub(crate) async fn handle_command(
        &self,
        input: &OrchestratorInput,
        text: &str,
    ) -> Result<MessageOutcome> {
        let mut parts = text.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();

        match command.as_str() {
            "/reset" => self.ask_reset(input).await,
            "/tier" => self.set_tier(input, argument).await,
            _ => self.reply(input, HELP_TEXT).await,
        }
    }

    async fn ask_reset(&self, input: &OrchestratorInput) -> Result<MessageOutcome> {
        let question = "Reset your conversation history? React ✅ to confirm or ❌ to cancel.";
        let message_id = self.transport.send(&input.chat_id, question).await?;

        let prompt = PendingPrompt {
            user_id: input.user_id.clone(),
            chat_id: input.chat_id.clone(),
            question: question.to_string(),
            options: vec![
                PromptOption::new("✅", ACTION_CONFIRM_RESET),
                PromptOption::new("❌", ACTION_CANCEL),
            ],
        };
        let signals = prompt.signals();

        self.metadata.remove(&message_id);
        self.prompts.register(&message_id, prompt);
        if let Err(e) = self
            .transport
            .set_reactions(&input.chat_id, &message_id, &signals)
            .await
        {
            warn!(error = %e, "Could not offer confirmation reactions");
        }

        Ok(MessageOutcome::Command { message_id })
    }

    async fn set_tier(
        &self,
        input: &OrchestratorInput,
        argument: Option<&str>,
    ) -> Result<MessageOutcome> {
        let reply = match argument {
            Some(arg) if arg.eq_ignore_ascii_case("auto") => {
                self.sessions
                    .clear_context(&input.user_id, TIER_OVERRIDE_KEY)
                    .await;
                "⚙️ Tier selection is automatic again.".to_string()
            }
            Some(arg) => match arg.parse::<ModelTier>() {
                Ok(tier) => {
                    self.sessions
                        .set_context(
                            &input.user_id,
                            TIER_OVERRIDE_KEY,
                            serde_json::json!(tier.as_str()),
                        )
                        .await;
                    info!(user = %input.user_id, %tier, "Tier override set");
                    format!("⚙️ Using the {} tier until you send /tier auto.", tier)
                }
                Err(_) => format!("Unknown tier '{}'.\n\n{}", arg, HELP_TEXT),
            },
            None => {
                let current = self
                    .sessions
                    .get(&input.user_id)
                    .await
                    .and_then(|s| s.tier_override());
                match current {
                    Some(tier) => format!("⚙️ Tier pinned to {}.", tier),
                    None => "⚙️ Tier selection is automatic.".to_string(),
                }
            }
        };
        self.reply(input, &reply).await
    }

    async fn reply(&self, input: &OrchestratorInput, text: &str) -> Result<MessageOutcome> {
        let message_id = self.transport.send(&input.chat_id, text).await?;
        Ok(MessageOutcome::Command { message_id })
    }

    /// Handle a reaction event, acting on answered prompts
    #[instrument(skip_all, fields(message_id = %event.message_id))]
    pub async fn handle_reaction(&self, event: &ReactionEvent) -> ReactionOutcome {
        let outcome = self.reactions.handle(event).await;

        if let ReactionOutcome::PromptResolved { action, prompt, .. } = &outcome {
            let reply = match action.as_str() {
                ACTION_CONFIRM_RESET => {
                    self.sessions.delete(&prompt.user_id).await;
                    "🧹 Conversation reset."
                }
                _ => "👌 Reset cancelled.",
            };
            if let Err(e) = self.transport.send(&prompt.chat_id, reply).await {
                warn!(error = %e, "Failed to confirm prompt action");
            }
        }

        outcome
    }

    /// Drop expired metadata and prompts
    pub fn sweep(&self) -> (usize, usize) {
        (self.metadata.sweep(), self.prompts.sweep())
    }
}
