//! Server initialization and the console run loop

use super::background_tasks;
use super::config::AppConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use switchyard_channels::{parse_console_line, ConsoleTransport, InboundEvent};
use switchyard_core::{
    format_error_for_chat, CapabilityTable, Dispatcher, MessageTransport, Orchestrator,
    OrchestratorInput, SessionManager, SkillTable,
};
use switchyard_llm::MessagesApiClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Chat id used for the console
const CONSOLE_CHAT: &str = "console";

/// Build the orchestrator from configuration
pub async fn build_orchestrator(
    config: &AppConfig,
    transport: Arc<dyn MessageTransport>,
) -> Result<Arc<Orchestrator>> {
    let data_dir = config.data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let sessions = SessionManager::load(config.session_path()).await;
    info!(sessions = sessions.len().await, "Sessions ready");

    let backend = MessagesApiClient::new(config.llm.backend_config())
        .context("Failed to create model backend")?;

    let skills = SkillTable::default_table();
    let dispatcher = Dispatcher::new(Arc::new(backend), CapabilityTable::new(), &skills)
        .context("Invalid handler table")?
        .with_models(config.llm.models.clone())
        .with_timeouts(config.llm.timeouts)
        .with_max_tokens(config.llm.max_tokens);

    for (tier, model, inferred) in config.llm.models.mismatches() {
        warn!(%tier, %model, %inferred, "Configured model looks like a different tier");
    }

    Ok(Arc::new(Orchestrator::new(
        config.orchestrator_config(),
        skills,
        dispatcher,
        sessions,
        transport,
    )))
}

/// Run the console chat loop until EOF or ctrl-c
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting Switchyard v{}", env!("CARGO_PKG_VERSION"));

    let transport = Arc::new(ConsoleTransport::stdout());
    let orchestrator = build_orchestrator(&config, transport.clone()).await?;

    let shutdown = CancellationToken::new();
    background_tasks::start_sweep_task(
        &orchestrator,
        Duration::from_secs(config.metadata.sweep_interval_secs),
        &shutdown,
    );
    background_tasks::start_autosave_task(
        &orchestrator,
        Duration::from_secs(config.session.autosave_secs),
        &shutdown,
    );

    let user_id = std::env::var("USER").unwrap_or_else(|_| "console".to_string());
    eprintln!("Type a message, `!<message-id> <emoji>` to react, /help for commands. Ctrl-D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let orchestrator = orchestrator.clone();
                    let transport = transport.clone();
                    let user_id = user_id.clone();
                    in_flight.spawn(async move {
                        handle_line(&orchestrator, transport.as_ref(), &user_id, &line).await;
                    });
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!("Message task failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Message task failed: {}", e);
        }
    }

    shutdown.cancel();
    orchestrator
        .sessions()
        .save()
        .await
        .context("Final session save failed")?;
    info!("Switchyard stopped");
    Ok(())
}

async fn handle_line(
    orchestrator: &Orchestrator,
    transport: &dyn MessageTransport,
    user_id: &str,
    line: &str,
) {
    match parse_console_line(line, CONSOLE_CHAT, user_id) {
        Ok(Some(InboundEvent::Message(msg))) => {
            let input = OrchestratorInput::new(msg.chat_id, msg.user_id, msg.text);
            if let Err(e) = orchestrator.process(&input).await {
                warn!("Message handling failed: {}", e);
                if let Err(e) = transport.send(CONSOLE_CHAT, &format_error_for_chat(&e)).await {
                    error!("Failed to report error: {}", e);
                }
            }
        }
        Ok(Some(InboundEvent::Reaction(event))) => {
            let outcome = orchestrator.handle_reaction(&event).await;
            debug!(?outcome, "Reaction handled");
        }
        Ok(None) => {}
        Err(e) => warn!("Ignoring console input: {}", e),
    }
}
