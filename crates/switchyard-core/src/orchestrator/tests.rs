//! Orchestrator tests

use super::{MessageOutcome, Orchestrator, OrchestratorConfig, OrchestratorInput};
use crate::dispatch::{CapabilityTable, Dispatcher, FnHandler, HandlerOutput, Strategy};
use crate::reactions::ReactionOutcome;
use crate::render::Verbosity;
use crate::routing::SkillTable;
use crate::session::SessionManager;
use crate::transport::{Outbound, ReactionEvent, RecordingTransport};
use std::sync::Arc;
use switchyard_llm::{MockBackend, ModelTier};

struct Harness {
    orchestrator: Orchestrator,
    backend: MockBackend,
    transport: RecordingTransport,
}

fn harness_with(handlers: CapabilityTable) -> Harness {
    let backend = MockBackend::new();
    let transport = RecordingTransport::new();
    let skills = SkillTable::default_table();
    let dispatcher = Dispatcher::new(Arc::new(backend.clone()), handlers, &skills).unwrap();
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default(),
        skills,
        dispatcher,
        SessionManager::in_memory(),
        Arc::new(transport.clone()),
    );
    Harness {
        orchestrator,
        backend,
        transport,
    }
}

fn harness() -> Harness {
    harness_with(CapabilityTable::new())
}

fn input(text: &str) -> OrchestratorInput {
    OrchestratorInput::new("chat-1", "user-1", text)
}

#[test]
fn test_orchestrator_config() {
    let config = OrchestratorConfig::new()
        .with_history_turns(4)
        .with_deep_threshold(6);
    assert_eq!(config.history_turns, 4);
    assert_eq!(config.deep_threshold, 6);
}

#[tokio::test]
async fn test_trivial_question_routes_general_fast() {
    let h = harness();
    h.backend.push_text("4");

    let outcome = h.orchestrator.process(&input("what is 2+2")).await.unwrap();
    let MessageOutcome::Answered {
        message_id,
        skill,
        tier,
        strategy,
    } = outcome
    else {
        panic!("expected an answer");
    };
    assert_eq!(skill, "general");
    assert_eq!(tier, ModelTier::Fast);
    assert_eq!(strategy, Strategy::Model);

    let record = h.orchestrator.metadata().get(&message_id).unwrap().value;
    assert_eq!(record.classification.confidence, 0.0);
    assert_eq!(record.response, "4");
    assert_eq!(record.verbosity, Verbosity::Medium);
    assert!(record.metrics.breakdown().complete);

    let session = h.orchestrator.sessions().get("user-1").await.unwrap();
    assert_eq!(session.turn_count, 1);
    assert_eq!(session.history.len(), 2);

    // general skill sends the raw text
    let sent = &h.backend.requests()[0];
    assert!(sent.messages.last().unwrap().content.ends_with("what is 2+2"));
    assert_eq!(sent.model, "claude-3-5-haiku-20241022");
}

#[tokio::test]
async fn test_review_architecture_routes_deep() {
    let h = harness();
    let outcome = h
        .orchestrator
        .process(&input(
            "Please review this pull request and check the architecture",
        ))
        .await
        .unwrap();
    match outcome {
        MessageOutcome::Answered { skill, tier, .. } => {
            assert_eq!(skill, "pr-review");
            assert_eq!(tier, ModelTier::Deep);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let requests = h.backend.requests();
    let prompt = &requests[0].messages.last().unwrap().content;
    assert!(prompt.contains("reviewing a pull request"));
}

#[tokio::test]
async fn test_result_offers_reactions() {
    let h = harness();
    h.orchestrator.process(&input("hello")).await.unwrap();

    let reactions = h.transport.outbound().into_iter().find_map(|o| match o {
        Outbound::Reactions { symbols, .. } => Some(symbols),
        _ => None,
    });
    let symbols = reactions.unwrap();
    assert!(symbols.contains(&"🤐".to_string()));
    assert!(symbols.contains(&"📊".to_string()));
    assert!(!symbols.contains(&"💬".to_string()));
}

#[tokio::test]
async fn test_handler_answers_skill() {
    let handler = Arc::new(FnHandler::new("docker", |_input, _ctx| async {
        Ok(HandlerOutput::Success("2 containers running".to_string()))
    }));
    let h = harness_with(CapabilityTable::new().with_handler("container", handler));

    let outcome = h.orchestrator.process(&input("docker ps")).await.unwrap();
    assert!(matches!(
        outcome,
        MessageOutcome::Answered {
            strategy: Strategy::Handler,
            ..
        }
    ));
    assert_eq!(h.backend.call_count(), 0);
    assert!(h.transport.sent_texts()[0].starts_with("2 containers running"));
}

#[tokio::test]
async fn test_backend_failure_not_recorded_in_history() {
    let h = harness();
    h.backend
        .push_result(Err(switchyard_llm::Error::Unavailable("down".to_string())));

    let outcome = h.orchestrator.process(&input("hello")).await.unwrap();
    let MessageOutcome::Answered {
        message_id,
        strategy,
        ..
    } = outcome
    else {
        panic!("expected an answer");
    };
    assert_eq!(strategy, Strategy::Error);
    assert!(h.transport.sent_texts()[0].contains("unavailable"));
    assert!(h.orchestrator.sessions().get("user-1").await.is_none());

    let record = h.orchestrator.metadata().get(&message_id).unwrap().value;
    assert!(record.metrics.flow.error);
}

#[tokio::test]
async fn test_history_passed_to_model() {
    let h = harness();
    h.backend.push_text("first answer");
    h.orchestrator.process(&input("first question")).await.unwrap();
    h.orchestrator.process(&input("second question")).await.unwrap();

    let second = &h.backend.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[0].content, "first question");
    assert_eq!(second.messages[1].content, "first answer");
}

#[tokio::test]
async fn test_tier_override_command() {
    let h = harness();
    h.orchestrator.process(&input("/tier premium")).await.unwrap();

    let outcome = h.orchestrator.process(&input("what is 2+2")).await.unwrap();
    assert!(matches!(
        outcome,
        MessageOutcome::Answered {
            tier: ModelTier::Premium,
            ..
        }
    ));

    h.orchestrator.process(&input("/tier auto")).await.unwrap();
    let outcome = h.orchestrator.process(&input("what is 3+3")).await.unwrap();
    assert!(matches!(
        outcome,
        MessageOutcome::Answered {
            tier: ModelTier::Fast,
            ..
        }
    ));
}

#[tokio::test]
async fn test_reset_requires_confirmation_once() {
    let h = harness();
    h.orchestrator.process(&input("hello")).await.unwrap();

    let MessageOutcome::Command { message_id } =
        h.orchestrator.process(&input("/reset")).await.unwrap()
    else {
        panic!("expected a command reply");
    };
    assert!(h.orchestrator.prompts().contains(&message_id));
    assert!(h.orchestrator.metadata().get(&message_id).is_none());
    assert!(h.orchestrator.sessions().get("user-1").await.is_some());

    let confirm = ReactionEvent::emoji(message_id.clone(), "user-1", "✅");
    let outcome = h.orchestrator.handle_reaction(&confirm).await;
    assert!(matches!(outcome, ReactionOutcome::PromptResolved { .. }));
    assert!(h.orchestrator.sessions().get("user-1").await.is_none());
    assert!(h
        .transport
        .sent_texts()
        .last()
        .unwrap()
        .contains("Conversation reset"));

    let again = h.orchestrator.handle_reaction(&confirm).await;
    assert!(!matches!(again, ReactionOutcome::PromptResolved { .. }));
}

#[tokio::test]
async fn test_reset_cancel_keeps_session() {
    let h = harness();
    h.orchestrator.process(&input("hello")).await.unwrap();
    let MessageOutcome::Command { message_id } =
        h.orchestrator.process(&input("/reset")).await.unwrap()
    else {
        panic!("expected a command reply");
    };

    h.orchestrator
        .handle_reaction(&ReactionEvent::emoji(message_id, "user-1", "❌"))
        .await;
    assert!(h.orchestrator.sessions().get("user-1").await.is_some());
}

#[tokio::test]
async fn test_verbosity_reaction_edits_result() {
    let h = harness();
    h.backend
        .push_text(format!("Short.\n\n{}", "Longer explanation. ".repeat(30)));
    let MessageOutcome::Answered { message_id, .. } =
        h.orchestrator.process(&input("hello")).await.unwrap()
    else {
        panic!("expected an answer");
    };

    let outcome = h
        .orchestrator
        .handle_reaction(&ReactionEvent::emoji(message_id.clone(), "user-1", "🤐"))
        .await;
    assert_eq!(
        outcome,
        ReactionOutcome::VerbosityChanged {
            from: Verbosity::Medium,
            to: Verbosity::Minimal
        }
    );
    let edited = h.transport.outbound().into_iter().any(|o| {
        matches!(o, Outbound::Edited { message_id: ref id, ref text, .. } if *id == message_id && text == "Short. …")
    });
    assert!(edited);
}

#[tokio::test]
async fn test_unknown_command_shows_help() {
    let h = harness();
    h.orchestrator.process(&input("/frobnicate")).await.unwrap();
    assert!(h.transport.sent_texts()[0].starts_with("Commands:"));
}

#[tokio::test]
async fn test_blank_input_ignored() {
    let h = harness();
    assert_eq!(
        h.orchestrator.process(&input("   ")).await.unwrap(),
        MessageOutcome::Ignored
    );
    assert!(h.transport.outbound().is_empty());
}
