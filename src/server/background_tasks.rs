//! Background tasks
//!
//! Periodic store sweeps and session autosave. Both stop when the shutdown
//! token is cancelled.

use std::sync::Arc;
use std::time::Duration;
use switchyard_core::Orchestrator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Start the metadata and prompt sweep task
pub fn start_sweep_task(orchestrator: &Arc<Orchestrator>, interval: Duration, shutdown: &CancellationToken) {
    if interval.is_zero() {
        info!("Store sweep disabled by configuration");
        return;
    }

    let orchestrator = orchestrator.clone();
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let (metadata, prompts) = orchestrator.sweep();
                    if metadata + prompts > 0 {
                        debug!(metadata, prompts, "Swept expired entries");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Sweep task shutting down");
                    break;
                }
            }
        }
    });
    info!("Sweep task started ({}s interval)", interval.as_secs());
}

/// Start the session autosave task
pub fn start_autosave_task(orchestrator: &Arc<Orchestrator>, interval: Duration, shutdown: &CancellationToken) {
    if interval.is_zero() {
        info!("Session autosave disabled by configuration");
        return;
    }

    let orchestrator = orchestrator.clone();
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = orchestrator.sessions().save().await {
                        warn!("Session autosave failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Autosave task shutting down");
                    break;
                }
            }
        }
    });
    info!("Autosave task started ({}s interval)", interval.as_secs());
}
