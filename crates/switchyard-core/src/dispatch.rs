//! Execution dispatcher
//!
//! Runs a routed request through an ordered list of strategies until one
//! produces a response:
//!
//! 1. **Handler**: a registered skill handler for the classified skill
//! 2. **Model**: a direct backend call with the built prompt and history
//! 3. **Error**: the last backend failure rendered for the user
//!
//! Handler failures, returned errors, panics and timeouts all fall through to
//! the next strategy. Nothing is retried.

use crate::error::{format_error_for_chat, Error, Result};
use crate::metrics::{FlowUpdate, RequestMetrics};
use crate::routing::SkillTable;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use switchyard_llm::{
    Message, MessageRole, ModelBackend, ModelRequest, ModelTier, TierModels, TierTimeouts,
};
use tracing::{debug, info, instrument, warn};

/// Identity and capability statement prepended to the final user message
pub const DEFAULT_PREAMBLE: &str = "You are Switchyard, a task-routing assistant. \
Requests may cover code review, web search, running code, container management, \
file transfer, document extraction and software architecture. \
Answer directly and say so when something is outside what you can do.";

/// What a skill handler produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutput {
    /// Result text for the user
    Success(String),
    /// The handler could not do the job
    Failure(String),
}

/// Inputs available to a skill handler
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// Requesting user
    pub user_id: String,
    /// Classified skill
    pub skill: String,
    /// Selected tier
    pub tier: ModelTier,
    /// Built prompt
    pub prompt: String,
    /// Recent history, oldest first
    pub history: Vec<Message>,
}

/// A skill implementation
#[async_trait::async_trait]
pub trait SkillHandler: Send + Sync {
    /// Handler name for logs and metrics
    fn name(&self) -> &str;

    /// Handle a raw request
    async fn handle(&self, input: &str, context: &HandlerContext) -> Result<HandlerOutput>;
}

/// Adapts an async closure into a [`SkillHandler`]
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(String, HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerOutput>> + Send,
{
    /// Wrap a closure
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait::async_trait]
impl<F, Fut> SkillHandler for FnHandler<F>
where
    F: Fn(String, HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HandlerOutput>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, input: &str, context: &HandlerContext) -> Result<HandlerOutput> {
        (self.f)(input.to_string(), context.clone()).await
    }
}

/// Skill id to handler map
#[derive(Clone, Default)]
pub struct CapabilityTable {
    handlers: HashMap<String, Arc<dyn SkillHandler>>,
}

impl CapabilityTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a skill
    #[must_use]
    pub fn with_handler(mut self, skill: impl Into<String>, handler: Arc<dyn SkillHandler>) -> Self {
        self.handlers.insert(skill.into(), handler);
        self
    }

    /// Reject handlers registered for skills the classifier cannot produce
    pub fn validate(&self, skills: &SkillTable) -> Result<()> {
        let mut unknown: Vec<&str> = self
            .handlers
            .keys()
            .map(String::as_str)
            .filter(|id| !skills.contains(id))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(Error::Configuration(format!(
            "handlers registered for unknown skills: {}",
            unknown.join(", ")
        )))
    }

    /// Handler for a skill
    #[must_use]
    pub fn get(&self, skill: &str) -> Option<&Arc<dyn SkillHandler>> {
        self.handlers.get(skill)
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Strategies in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Registered skill handler
    Handler,
    /// Direct model call
    Model,
    /// User-facing error
    Error,
}

const STRATEGIES: [Strategy; 3] = [Strategy::Handler, Strategy::Model, Strategy::Error];

/// A request ready for execution
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Requesting user
    pub user_id: String,
    /// Classified skill
    pub skill: String,
    /// Raw request text
    pub input: String,
    /// Built prompt
    pub prompt: String,
    /// Selected tier
    pub tier: ModelTier,
    /// Bounded recent history, oldest first
    pub history: Vec<Message>,
}

/// Dispatch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Text to show the user
    pub text: String,
    /// Strategy that produced the text
    pub strategy: Strategy,
    /// Backend model, when the model strategy answered
    pub model: Option<String>,
}

impl DispatchOutcome {
    /// Whether every real strategy failed
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.strategy == Strategy::Error
    }
}

enum Step {
    Done(DispatchOutcome),
    Skipped,
    Failed(Error),
}

/// Resolves and executes handlers with fallback
pub struct Dispatcher {
    handlers: CapabilityTable,
    backend: Arc<dyn ModelBackend>,
    models: TierModels,
    timeouts: TierTimeouts,
    max_tokens: u32,
    preamble: String,
}

impl Dispatcher {
    /// Create a dispatcher, validating the handler table against the skills
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        handlers: CapabilityTable,
        skills: &SkillTable,
    ) -> Result<Self> {
        handlers.validate(skills)?;
        Ok(Self {
            handlers,
            backend,
            models: TierModels::default(),
            timeouts: TierTimeouts::default(),
            max_tokens: 4096,
            preamble: DEFAULT_PREAMBLE.to_string(),
        })
    }

    /// Set the model for each tier
    #[must_use]
    pub fn with_models(mut self, models: TierModels) -> Self {
        self.models = models;
        self
    }

    /// Set the deadline for each tier
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TierTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the model token budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the preamble
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// The backend in use
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    /// Run the strategy chain. Always produces an outcome.
    #[instrument(skip_all, fields(user = %request.user_id, skill = %request.skill, tier = %request.tier))]
    pub async fn dispatch(
        &self,
        request: &DispatchRequest,
        metrics: &mut RequestMetrics,
    ) -> DispatchOutcome {
        let mut last_error: Option<Error> = None;

        for strategy in STRATEGIES {
            let step = match strategy {
                Strategy::Handler => self.run_handler(request).await,
                Strategy::Model => self.run_model(request).await,
                Strategy::Error => Step::Done(self.terminal(last_error.take())),
            };

            match step {
                Step::Done(outcome) => {
                    metrics.set_flow(FlowUpdate::Handler(strategy_label(strategy, request)));
                    if outcome.is_error() {
                        metrics.set_flow(FlowUpdate::Error(outcome.text.clone()));
                    }
                    info!(strategy = ?strategy, "Dispatch complete");
                    return outcome;
                }
                Step::Skipped => {}
                Step::Failed(e) => {
                    warn!(strategy = ?strategy, error = %e, "Strategy failed, falling back");
                    metrics.set_flow(FlowUpdate::Handler(format!(
                        "{}(failed)",
                        strategy_label(strategy, request)
                    )));
                    last_error = Some(e);
                }
            }
        }

        self.terminal(last_error)
    }

    async fn run_handler(&self, request: &DispatchRequest) -> Step {
        let Some(handler) = self.handlers.get(&request.skill) else {
            return Step::Skipped;
        };

        let context = HandlerContext {
            user_id: request.user_id.clone(),
            skill: request.skill.clone(),
            tier: request.tier,
            prompt: request.prompt.clone(),
            history: request.history.clone(),
        };
        let deadline = self.timeouts.for_tier(request.tier);
        debug!(handler = handler.name(), ?deadline, "Invoking skill handler");

        let call = AssertUnwindSafe(handler.handle(&request.input, &context)).catch_unwind();
        let failure = |message: String| Error::Handler {
            skill: request.skill.clone(),
            message,
        };

        match tokio::time::timeout(deadline, call).await {
            Err(_) => Step::Failed(failure(format!("timed out after {:?}", deadline))),
            Ok(Err(panic)) => Step::Failed(failure(panic_message(&*panic))),
            Ok(Ok(Err(e))) => Step::Failed(failure(e.to_string())),
            Ok(Ok(Ok(HandlerOutput::Failure(message)))) => Step::Failed(failure(message)),
            Ok(Ok(Ok(HandlerOutput::Success(text)))) => Step::Done(DispatchOutcome {
                text,
                strategy: Strategy::Handler,
                model: None,
            }),
        }
    }

    async fn run_model(&self, request: &DispatchRequest) -> Step {
        let model = self.models.model_for(request.tier).to_string();
        let deadline = self.timeouts.for_tier(request.tier);
        let messages = self.build_messages(request);

        let model_request = ModelRequest::new(model.clone(), messages)
            .with_max_tokens(self.max_tokens)
            .with_timeout(deadline);

        debug!(backend = self.backend.name(), %model, "Invoking model");
        let call = AssertUnwindSafe(self.backend.invoke(model_request)).catch_unwind();
        match tokio::time::timeout(deadline, call).await {
            Err(_) => Step::Failed(switchyard_llm::Error::Timeout(deadline.as_millis() as u64).into()),
            Ok(Err(panic)) => Step::Failed(Error::Internal(panic_message(&*panic))),
            Ok(Ok(Err(e))) => Step::Failed(e.into()),
            Ok(Ok(Ok(response))) => Step::Done(DispatchOutcome {
                text: response.content,
                strategy: Strategy::Model,
                model: Some(response.model),
            }),
        }
    }

    fn terminal(&self, error: Option<Error>) -> DispatchOutcome {
        let text = match error {
            Some(e @ Error::Backend(_)) => format_error_for_chat(&e),
            Some(e) => format_error_for_chat(&Error::Internal(e.to_string())),
            None => "❌ No handler could process this request.".to_string(),
        };
        DispatchOutcome {
            text,
            strategy: Strategy::Error,
            model: None,
        }
    }

    /// Backend messages: alternating history, then the prompt with the
    /// preamble folded into the final user message
    fn build_messages(&self, request: &DispatchRequest) -> Vec<Message> {
        let mut messages = normalize_history(&request.history);
        let final_text = if self.preamble.is_empty() {
            request.prompt.clone()
        } else {
            format!("{}\n\n{}", self.preamble, request.prompt)
        };
        messages.push(Message::user(final_text));
        messages
    }
}

/// Drop leading assistant turns and merge same-role neighbours so the
/// sequence alternates starting with the user and ends with the assistant
fn normalize_history(history: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(history.len());
    for message in history
        .iter()
        .skip_while(|m| m.role == MessageRole::Assistant)
    {
        match out.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => out.push(message.clone()),
        }
    }
    if out.last().is_some_and(|m| m.role == MessageRole::User) {
        out.pop();
    }
    out
}

fn strategy_label(strategy: Strategy, request: &DispatchRequest) -> String {
    match strategy {
        Strategy::Handler => format!("handler:{}", request.skill),
        Strategy::Model => format!("model:{}", request.tier),
        Strategy::Error => "error".to_string(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use switchyard_llm::MockBackend;

    fn request(skill: &str, tier: ModelTier) -> DispatchRequest {
        DispatchRequest {
            user_id: "u1".to_string(),
            skill: skill.to_string(),
            input: "raw input".to_string(),
            prompt: "built prompt".to_string(),
            tier,
            history: vec![Message::user("earlier"), Message::assistant("reply")],
        }
    }

    fn dispatcher(backend: MockBackend, handlers: CapabilityTable) -> Dispatcher {
        Dispatcher::new(Arc::new(backend), handlers, &SkillTable::default_table()).unwrap()
    }

    fn ok_handler(text: &'static str) -> Arc<dyn SkillHandler> {
        Arc::new(FnHandler::new("ok", move |_input, _ctx| async move {
            Ok(HandlerOutput::Success(text.to_string()))
        }))
    }

    #[tokio::test]
    async fn test_handler_wins() {
        let backend = MockBackend::new();
        let handlers = CapabilityTable::new().with_handler("search", ok_handler("found it"));
        let d = dispatcher(backend.clone(), handlers);
        let mut metrics = RequestMetrics::new("r");

        let outcome = d.dispatch(&request("search", ModelTier::Fast), &mut metrics).await;
        assert_eq!(outcome.text, "found it");
        assert_eq!(outcome.strategy, Strategy::Handler);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(metrics.flow.handlers, vec!["handler:search"]);
    }

    #[tokio::test]
    async fn test_handler_input_is_raw_text() {
        let handler: Arc<dyn SkillHandler> =
            Arc::new(FnHandler::new("echo", |input, ctx: HandlerContext| async move {
                Ok(HandlerOutput::Success(format!("{input}|{}", ctx.skill)))
            }));
        let d = dispatcher(MockBackend::new(), CapabilityTable::new().with_handler("extract", handler));
        let outcome = d
            .dispatch(&request("extract", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;
        assert_eq!(outcome.text, "raw input|extract");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_model() {
        let backend = MockBackend::new();
        backend.push_text("model answer");
        let failing: Arc<dyn SkillHandler> = Arc::new(FnHandler::new("bad", |_i, _c| async {
            Ok(HandlerOutput::Failure("no results".to_string()))
        }));
        let d = dispatcher(backend.clone(), CapabilityTable::new().with_handler("search", failing));
        let mut metrics = RequestMetrics::new("r");

        let outcome = d.dispatch(&request("search", ModelTier::Deep), &mut metrics).await;
        assert_eq!(outcome.text, "model answer");
        assert_eq!(outcome.strategy, Strategy::Model);
        assert_eq!(
            metrics.flow.handlers,
            vec!["handler:search(failed)", "model:deep"]
        );
        assert_eq!(backend.requests()[0].model, "claude-sonnet-4-5-20250929");
    }

    #[tokio::test]
    async fn test_error_and_panic_fall_back() {
        let erroring: Arc<dyn SkillHandler> = Arc::new(FnHandler::new("err", |_i, _c| async {
            Err(Error::Internal("boom".to_string()))
        }));
        let d = dispatcher(MockBackend::new(), CapabilityTable::new().with_handler("search", erroring));
        let outcome = d
            .dispatch(&request("search", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;
        assert_eq!(outcome.strategy, Strategy::Model);

        struct Panicking;
        #[async_trait::async_trait]
        impl SkillHandler for Panicking {
            fn name(&self) -> &str {
                "panicking"
            }
            async fn handle(&self, _input: &str, _ctx: &HandlerContext) -> Result<HandlerOutput> {
                panic!("handler bug");
            }
        }
        let d = dispatcher(
            MockBackend::new(),
            CapabilityTable::new().with_handler("container", Arc::new(Panicking)),
        );
        let outcome = d
            .dispatch(&request("container", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;
        assert_eq!(outcome.strategy, Strategy::Model);
    }

    #[tokio::test]
    async fn test_backend_failure_is_terminal_error() {
        let backend = MockBackend::new();
        backend.push_result(Err(switchyard_llm::Error::Unavailable("refused".to_string())));
        let d = dispatcher(backend.clone(), CapabilityTable::new());
        let mut metrics = RequestMetrics::new("r");

        let outcome = d.dispatch(&request("general", ModelTier::Fast), &mut metrics).await;
        assert!(outcome.is_error());
        assert!(outcome.text.contains("unavailable"));
        assert!(metrics.flow.error);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_timeout_is_failure() {
        let backend = MockBackend::new().with_delay(Duration::from_secs(120));
        let d = dispatcher(backend, CapabilityTable::new());
        let outcome = d
            .dispatch(&request("general", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;
        assert!(outcome.is_error());
        assert!(outcome.text.contains("too long"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_timeout_falls_back() {
        let slow: Arc<dyn SkillHandler> = Arc::new(FnHandler::new("slow", |_i, _c| async {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(HandlerOutput::Success("late".to_string()))
        }));
        let backend = MockBackend::new();
        backend.push_text("fallback");
        let d = dispatcher(backend, CapabilityTable::new().with_handler("search", slow));
        let outcome = d
            .dispatch(&request("search", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;
        assert_eq!(outcome.text, "fallback");
    }

    #[tokio::test]
    async fn test_preamble_in_final_user_message() {
        let backend = MockBackend::new();
        let d = dispatcher(backend.clone(), CapabilityTable::new()).with_preamble("IDENTITY");
        d.dispatch(&request("general", ModelTier::Fast), &mut RequestMetrics::new("r"))
            .await;

        let sent = &backend.requests()[0];
        assert_eq!(sent.messages.len(), 3);
        assert_eq!(sent.messages[0].content, "earlier");
        let last = sent.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "IDENTITY\n\nbuilt prompt");
        assert_eq!(sent.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_unknown_skill_handler_rejected() {
        let handlers = CapabilityTable::new().with_handler("weather", ok_handler("sunny"));
        let result = Dispatcher::new(
            Arc::new(MockBackend::new()),
            handlers,
            &SkillTable::default_table(),
        );
        assert!(matches!(result, Err(Error::Configuration(msg)) if msg.contains("weather")));
    }

    #[test]
    fn test_normalize_history() {
        let history = vec![
            Message::assistant("orphan"),
            Message::user("a"),
            Message::user("b"),
            Message::assistant("c"),
            Message::user("dangling"),
        ];
        let normalized = normalize_history(&history);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].content, "a\n\nb");
        assert_eq!(normalized[1].role, MessageRole::Assistant);
    }
}
