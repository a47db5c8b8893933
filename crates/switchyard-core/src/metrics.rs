//! Per-request timing metrics
//!
//! Each request records named checkpoints as it moves through the pipeline,
//! plus flow metadata describing how it was routed. A record reduces to a
//! stage-by-stage [`Breakdown`] or a one-line [`MetricsSummary`].
//!
//! ```
//! use switchyard_core::metrics::{Checkpoint, FlowUpdate, RequestMetrics};
//!
//! let mut metrics = RequestMetrics::new("req-1");
//! metrics.mark(Checkpoint::Received);
//! metrics.set_flow(FlowUpdate::Handler("search".to_string()));
//! metrics.mark(Checkpoint::ResponseSent);
//! assert!(metrics.breakdown().complete);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use switchyard_llm::ModelTier;

/// Pipeline checkpoints, declared in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Message arrived
    Received,
    /// Skill classified
    Classified,
    /// Tier chosen
    TierChosen,
    /// Prompt built
    PromptBuilt,
    /// Dispatch started
    ExecutionStart,
    /// Dispatch finished
    ExecutionEnd,
    /// Response formatting started
    FormatStart,
    /// Response formatting finished
    FormatEnd,
    /// Response delivered
    ResponseSent,
}

impl Checkpoint {
    /// All checkpoints in pipeline order
    pub const ALL: [Checkpoint; 9] = [
        Checkpoint::Received,
        Checkpoint::Classified,
        Checkpoint::TierChosen,
        Checkpoint::PromptBuilt,
        Checkpoint::ExecutionStart,
        Checkpoint::ExecutionEnd,
        Checkpoint::FormatStart,
        Checkpoint::FormatEnd,
        Checkpoint::ResponseSent,
    ];

    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::TierChosen => "tier_chosen",
            Self::PromptBuilt => "prompt_built",
            Self::ExecutionStart => "execution_start",
            Self::ExecutionEnd => "execution_end",
            Self::FormatStart => "format_start",
            Self::FormatEnd => "format_end",
            Self::ResponseSent => "response_sent",
        }
    }
}

/// Routing facts recorded alongside the timings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetadata {
    /// Classified skill
    pub skill: Option<String>,
    /// Selected tier
    pub tier: Option<ModelTier>,
    /// Complexity score
    pub complexity: Option<u32>,
    /// Classifier confidence
    pub confidence: Option<f32>,
    /// Strategies attempted, in order
    pub handlers: Vec<String>,
    /// Whether the request ended in an error
    pub error: bool,
    /// Error description
    pub error_message: Option<String>,
}

/// A single flow metadata update
#[derive(Debug, Clone, PartialEq)]
pub enum FlowUpdate {
    /// Set the skill
    Skill(String),
    /// Set the tier
    Tier(ModelTier),
    /// Set the complexity score
    Complexity(u32),
    /// Set the classifier confidence
    Confidence(f32),
    /// Append to the handler list
    Handler(String),
    /// Mark the request as failed
    Error(String),
}

/// Timing record for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetrics {
    /// Request id
    pub request_id: String,
    /// Checkpoint timestamps
    pub checkpoints: BTreeMap<Checkpoint, DateTime<Utc>>,
    /// Flow metadata
    pub flow: FlowMetadata,
}

/// Duration between two adjacent checkpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDuration {
    /// Earlier checkpoint
    pub from: Checkpoint,
    /// Later checkpoint
    pub to: Checkpoint,
    /// Milliseconds between them
    pub millis: i64,
}

/// Stage-by-stage timing view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Adjacent-checkpoint durations, omitting pairs with a missing side
    pub stages: Vec<StageDuration>,
    /// Received to sent, or received to now when incomplete
    pub total_millis: i64,
    /// Whether the response-sent checkpoint was reached
    pub complete: bool,
}

impl Breakdown {
    /// Render as a chat message
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("📊 Timing breakdown\n");
        for stage in &self.stages {
            out.push_str(&format!(
                "• {} → {}: {}ms\n",
                stage.from.as_str(),
                stage.to.as_str(),
                stage.millis
            ));
        }
        out.push_str(&format!("Total: {}ms", self.total_millis));
        if !self.complete {
            out.push_str(" (in progress)");
        }
        out
    }
}

/// One-line view of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Total milliseconds
    pub total_millis: i64,
    /// Selected tier
    pub tier: Option<ModelTier>,
    /// Classified skill
    pub skill: Option<String>,
    /// Whether the request failed
    pub error: bool,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ms | {} | {} | {}",
            self.total_millis,
            self.tier.map_or("-", |t| t.as_str()),
            self.skill.as_deref().unwrap_or("-"),
            if self.error { "error" } else { "ok" }
        )
    }
}

impl RequestMetrics {
    /// Create an empty record
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            checkpoints: BTreeMap::new(),
            flow: FlowMetadata::default(),
        }
    }

    /// Record a checkpoint now, overwriting any earlier mark
    pub fn mark(&mut self, checkpoint: Checkpoint) {
        self.mark_at(checkpoint, Utc::now());
    }

    /// Record a checkpoint at a given time
    pub fn mark_at(&mut self, checkpoint: Checkpoint, at: DateTime<Utc>) {
        self.checkpoints.insert(checkpoint, at);
    }

    /// Apply a flow metadata update
    pub fn set_flow(&mut self, update: FlowUpdate) {
        match update {
            FlowUpdate::Skill(skill) => self.flow.skill = Some(skill),
            FlowUpdate::Tier(tier) => self.flow.tier = Some(tier),
            FlowUpdate::Complexity(score) => self.flow.complexity = Some(score),
            FlowUpdate::Confidence(confidence) => self.flow.confidence = Some(confidence),
            FlowUpdate::Handler(name) => self.flow.handlers.push(name),
            FlowUpdate::Error(message) => {
                self.flow.error = true;
                self.flow.error_message = Some(message);
            }
        }
    }

    /// Stage durations and total
    #[must_use]
    pub fn breakdown(&self) -> Breakdown {
        self.breakdown_at(Utc::now())
    }

    fn breakdown_at(&self, now: DateTime<Utc>) -> Breakdown {
        let stages = Checkpoint::ALL
            .windows(2)
            .filter_map(|pair| {
                let from = self.checkpoints.get(&pair[0])?;
                let to = self.checkpoints.get(&pair[1])?;
                Some(StageDuration {
                    from: pair[0],
                    to: pair[1],
                    millis: (*to - *from).num_milliseconds(),
                })
            })
            .collect();

        let end = self.checkpoints.get(&Checkpoint::ResponseSent);
        let total_millis = match self.checkpoints.get(&Checkpoint::Received) {
            Some(start) => (*end.unwrap_or(&now) - *start).num_milliseconds(),
            None => 0,
        };

        Breakdown {
            stages,
            total_millis,
            complete: end.is_some(),
        }
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_millis: self.breakdown().total_millis,
            tier: self.flow.tier,
            skill: self.flow.skill.clone(),
            error: self.flow.error,
        }
    }
}
