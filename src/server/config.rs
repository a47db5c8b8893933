//! Application configuration types
//!
//! Mirrors the sections of `config/default.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use switchyard_core::OrchestratorConfig;
use switchyard_llm::{BackendConfig, TierModels, TierTimeouts};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for persisted state (defaults to `~/.switchyard`)
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        match self.data_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => expand_home(dir),
            _ => dirs::home_dir()
                .map(|h| h.join(".switchyard"))
                .unwrap_or_else(|| PathBuf::from(".switchyard")),
        }
    }

    /// Path of the session file
    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join(&self.session.file)
    }

    /// Orchestrator settings derived from this configuration
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new()
            .with_history_turns(self.llm.history_turns)
            .with_deep_threshold(self.routing.deep_threshold)
            .with_metadata_retention(Duration::from_secs(self.metadata.retention_secs))
            .with_prompt_ttl(Duration::from_secs(self.prompts.ttl_secs))
    }
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// History turns sent with each request
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    #[serde(default)]
    pub models: TierModels,
    #[serde(default)]
    pub timeouts: TierTimeouts,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            max_tokens: default_max_tokens(),
            history_turns: default_history_turns(),
            models: TierModels::default(),
            timeouts: TierTimeouts::default(),
        }
    }
}

impl LlmConfig {
    /// Backend client configuration
    pub fn backend_config(&self) -> BackendConfig {
        let config = BackendConfig::new(self.base_url.clone());
        match &self.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_history_turns() -> usize {
    10
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File name inside the data directory
    #[serde(default = "default_session_file")]
    pub file: String,
    /// Autosave interval (0 disables)
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: u64,
    /// Sessions idle for longer than this are pruned
    #[serde(default = "default_inactive_days")]
    pub inactive_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
            autosave_secs: default_autosave_secs(),
            inactive_days: default_inactive_days(),
        }
    }
}

fn default_session_file() -> String {
    "sessions.json".to_string()
}

fn default_autosave_secs() -> u64 {
    300
}

fn default_inactive_days() -> u64 {
    30
}

/// Message metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Pending prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_prompt_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_prompt_ttl_secs(),
        }
    }
}

fn default_prompt_ttl_secs() -> u64 {
    300
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Complexity score at which requests go to the deep tier
    #[serde(default = "default_deep_threshold")]
    pub deep_threshold: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            deep_threshold: default_deep_threshold(),
        }
    }
}

fn default_deep_threshold() -> u32 {
    4
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Daily-rotated log file, in addition to stderr
    #[serde(default)]
    pub file: Option<String>,
}
