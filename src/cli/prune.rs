//! Session pruning

use crate::server::config::AppConfig;
use anyhow::Context;
use std::time::Duration;
use switchyard_core::SessionManager;

const SECS_PER_DAY: u64 = 86_400;

pub async fn run(config: &AppConfig, days: u64) -> anyhow::Result<()> {
    let path = config.session_path();
    let sessions = SessionManager::load(&path).await;
    let before = sessions.len().await;

    let horizon = Duration::from_secs(days.saturating_mul(SECS_PER_DAY));
    let removed = sessions.cleanup_inactive(horizon).await;
    sessions
        .save()
        .await
        .with_context(|| format!("Failed to save {}", path.display()))?;

    println!(
        "🧹 Removed {} of {} sessions inactive for more than {} days",
        removed, before, days
    );
    Ok(())
}
