//! Switchyard Core - Routing and Reaction Engine
//!
//! This crate provides the core logic of the Switchyard task router,
//! including:
//! - Routing: keyword intent classification and complexity-based tier selection
//! - Prompt: per-skill instruction templates
//! - Dispatch: handler capability table with model and error fallbacks
//! - Session: per-user history with crash-safe persistence
//! - Metrics: per-request timing checkpoints
//! - Metadata/Pending: expiring stores keyed by outbound message id
//! - Reactions: verbosity, retry, explain, metrics and feedback signals
//! - Orchestrator: the end-to-end request pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatch;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod pending;
pub mod prompt;
pub mod reactions;
pub mod render;
pub mod routing;
pub mod session;
pub mod store;
pub mod transport;

pub use dispatch::{
    CapabilityTable, DispatchOutcome, DispatchRequest, Dispatcher, FnHandler, HandlerContext,
    HandlerOutput, SkillHandler, Strategy,
};
pub use error::{format_error_for_chat, Error, Result, UserFriendlyError};
pub use metadata::{Feedback, MessageMetadata, MessageMetadataStore};
pub use metrics::{Breakdown, Checkpoint, FlowUpdate, MetricsSummary, RequestMetrics};
pub use orchestrator::{MessageOutcome, Orchestrator, OrchestratorConfig, OrchestratorInput};
pub use pending::{PendingPrompt, PendingPromptStore, PromptOption};
pub use prompt::build_prompt;
pub use reactions::{ReactionController, ReactionOutcome, Signal};
pub use render::{render, Verbosity};
pub use routing::{Classification, SkillTable, TierSelection, TierSelector, GENERAL_SKILL};
pub use session::{Session, SessionManager, Turn};
pub use store::{ExpiringStore, Stamped};
pub use transport::{
    MessageTransport, Outbound, ReactionEvent, ReactionKind, ReactionValue, RecordingTransport,
};
