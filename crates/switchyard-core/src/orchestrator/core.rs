//! Orchestrator core structure

use crate::dispatch::Dispatcher;
use crate::metadata::MessageMetadataStore;
use crate::pending::PendingPromptStore;
use crate::reactions::ReactionController;
use crate::routing::{SkillTable, TierSelector};
use crate::session::SessionManager;
use crate::transport::MessageTransport;
use std::sync::Arc;
use tracing::info;

use super::config::OrchestratorConfig;

/// Main orchestrator that routes and answers messages
pub struct Orchestrator {
    pub(crate) skills: SkillTable,
    pub(crate) selector: TierSelector,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) sessions: SessionManager,
    pub(crate) metadata: MessageMetadataStore,
    pub(crate) prompts: PendingPromptStore,
    pub(crate) transport: Arc<dyn MessageTransport>,
    pub(crate) reactions: ReactionController,
    pub(crate) config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// The dispatcher must already be validated against `skills`.
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        skills: SkillTable,
        dispatcher: Dispatcher,
        sessions: SessionManager,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        let metadata = MessageMetadataStore::new(config.metadata_retention);
        let prompts = PendingPromptStore::new(config.prompt_ttl);
        let reactions = ReactionController::new(metadata.clone(), prompts.clone(), transport.clone());

        info!(
            skills = skills.skills().len(),
            history_turns = config.history_turns,
            deep_threshold = config.deep_threshold,
            "Orchestrator initialized"
        );

        Self {
            skills,
            selector: TierSelector::new(config.deep_threshold),
            dispatcher,
            sessions,
            metadata,
            prompts,
            transport,
            reactions,
            config,
        }
    }

    /// Session manager
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Message metadata store
    #[must_use]
    pub fn metadata(&self) -> &MessageMetadataStore {
        &self.metadata
    }

    /// Pending prompt store
    #[must_use]
    pub fn prompts(&self) -> &PendingPromptStore {
        &self.prompts
    }

    /// Skill table
    #[must_use]
    pub fn skills(&self) -> &SkillTable {
        &self.skills
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
