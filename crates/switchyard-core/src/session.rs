//! Per-user conversation sessions
//!
//! Sessions live in memory behind a `RwLock` and are persisted to a single
//! JSON file mapping user id to session. Saves copy the current file to a
//! backup path, write a temp file and rename it over the primary. Loading
//! never fails: a missing file gives an empty table and a corrupt file falls
//! back to the backup, then to an empty table.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use switchyard_llm::{Message, MessageRole, ModelTier};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Context key holding an explicit tier override
pub const TIER_OVERRIDE_KEY: &str = "tierOverride";

/// Context key holding the last skill used
pub const LAST_SKILL_KEY: &str = "lastSkill";

/// One message in a session history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker
    pub role: MessageRole,
    /// Text
    pub content: String,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

/// Conversation state for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Turns, oldest first
    #[serde(default)]
    pub history: Vec<Turn>,
    /// Free-form context values
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Completed exchanges
    #[serde(default)]
    pub turn_count: u64,
    /// Last time the session changed
    pub last_active: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            context: BTreeMap::new(),
            turn_count: 0,
            last_active: Utc::now(),
        }
    }
}

impl Session {
    /// The most recent `limit` turns as backend messages
    #[must_use]
    pub fn recent_history(&self, limit: usize) -> Vec<Message> {
        let start = self.history.len().saturating_sub(limit);
        self.history[start..]
            .iter()
            .map(|turn| Message {
                role: turn.role,
                content: turn.content.clone(),
            })
            .collect()
    }

    /// Explicit tier override stored in the context
    #[must_use]
    pub fn tier_override(&self) -> Option<ModelTier> {
        self.context
            .get(TIER_OVERRIDE_KEY)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    fn push(&mut self, role: MessageRole, content: &str, now: DateTime<Utc>) {
        self.history.push(Turn {
            role,
            content: content.to_string(),
            timestamp: now,
        });
        self.last_active = now;
    }

    fn push_exchange(&mut self, request: &str, response: &str, now: DateTime<Utc>) {
        self.push(MessageRole::User, request, now);
        self.push(MessageRole::Assistant, response, now);
        self.turn_count += 1;
    }
}

type SessionTable = HashMap<String, Session>;

/// Owns all sessions and their persistence
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<SessionTable>>,
    path: Option<PathBuf>,
    save_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    /// A manager that never touches disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            path: None,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load sessions from `path`, tolerating missing or corrupt files
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let table = match read_table(&path).await {
            Ok(Some(table)) => table,
            Ok(None) => {
                info!("No session file yet, starting empty");
                HashMap::new()
            }
            Err(e) => {
                warn!(error = %e, "Session file unreadable, trying backup");
                match read_table(&backup_path(&path)).await {
                    Ok(Some(table)) => {
                        info!(sessions = table.len(), "Recovered sessions from backup");
                        table
                    }
                    Ok(None) => HashMap::new(),
                    Err(e) => {
                        warn!(error = %e, "Backup unreadable too, starting empty");
                        HashMap::new()
                    }
                }
            }
        };

        debug!(sessions = table.len(), "Sessions loaded");
        Self {
            sessions: Arc::new(RwLock::new(table)),
            path: Some(path),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persistence path, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of a user's session
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Replace a user's session
    pub async fn set(&self, user_id: &str, session: Session) {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), session);
        self.persist().await;
    }

    /// Delete a user's session
    pub async fn delete(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(user_id).is_some();
        if removed {
            info!(user = %user_id, "Session deleted");
            self.persist().await;
        }
        removed
    }

    /// Append a user turn then an assistant turn as one exchange
    pub async fn record_exchange(&self, user_id: &str, request: &str, response: &str) {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions.entry(user_id.to_string()).or_default();
            session.push_exchange(request, response, Utc::now());
        }
        self.persist().await;
    }

    /// Record an answered exchange and the skill that answered it in one save
    pub async fn record_answer(&self, user_id: &str, request: &str, response: &str, skill: &str) {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions.entry(user_id.to_string()).or_default();
            session.push_exchange(request, response, Utc::now());
            session
                .context
                .insert(LAST_SKILL_KEY.to_string(), serde_json::json!(skill));
        }
        self.persist().await;
    }

    /// Set a context value
    pub async fn set_context(&self, user_id: &str, key: &str, value: serde_json::Value) {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions.entry(user_id.to_string()).or_default();
            session.context.insert(key.to_string(), value);
            session.last_active = Utc::now();
        }
        self.persist().await;
    }

    /// Remove a context value
    pub async fn clear_context(&self, user_id: &str, key: &str) {
        let changed = {
            let mut sessions = self.sessions.write().await;
            sessions
                .get_mut(user_id)
                .and_then(|s| s.context.remove(key))
                .is_some()
        };
        if changed {
            self.persist().await;
        }
    }

    /// Purge sessions inactive for longer than `horizon`
    pub async fn cleanup_inactive(&self, horizon: Duration) -> usize {
        let horizon = chrono::Duration::from_std(horizon).unwrap_or(chrono::Duration::MAX);
        let Some(cutoff) = Utc::now().checked_sub_signed(horizon) else {
            return 0;
        };
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| s.last_active > cutoff);
            before - sessions.len()
        };
        if removed > 0 {
            info!(removed, "Purged inactive sessions");
            self.persist().await;
        }
        removed
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether there are no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Write all sessions to disk
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.save_lock.lock().await;
        let json = {
            let sessions = self.sessions.read().await;
            serde_json::to_vec_pretty(&*sessions)?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            tokio::fs::copy(path, backup_path(path)).await?;
        }

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::Persistence(format!("rename {}: {}", tmp.display(), e)))?;
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.save().await {
            warn!(error = %e, "Session save failed");
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("json.bak")
}

async fn read_table(path: &Path) -> Result<Option<SessionTable>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
