//! Messages API client
//!
//! Speaks the `/v1/messages` wire format exposed by the model proxy. Requests
//! are always non-streaming; text content blocks in the response are
//! concatenated in order.

use crate::backend::{ModelBackend, ModelRequest, ModelResponse};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::util::mask_api_key;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// API version header value
const API_VERSION: &str = "2023-06-01";

/// Default proxy address
const DEFAULT_BASE_URL: &str = "http://localhost:8082";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

// ============================================================================
// Client
// ============================================================================

/// Backend connection configuration
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the proxy
    pub base_url: String,
    /// Optional API key sent as `x-api-key`
    pub api_key: Option<String>,
    /// Connect timeout
    pub connect_timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(mask_api_key))
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl BackendConfig {
    /// Create a configuration for a base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// HTTP client for the Messages API
pub struct MessagesApiClient {
    client: Client,
    config: BackendConfig,
}

impl MessagesApiClient {
    /// Create a new client
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::NotConfigured("llm.base_url is empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| Error::NotConfigured(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ModelBackend for MessagesApiClient {
    fn name(&self) -> &str {
        "messages-api"
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse> {
        let url = self.config.endpoint("/v1/messages");
        let timeout_ms = request.timeout.as_millis() as u64;
        let body = MessagesRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!("Sending request to {}", url);

        let mut builder = self
            .client
            .post(&url)
            .timeout(request.timeout)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_transport(&e, timeout_ms))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::from_transport(&e, timeout_ms))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Backend returned an error status");
            let err = Error::from_status(status.as_u16(), &text);
            return Err(match err {
                Error::Timeout(_) => Error::Timeout(timeout_ms),
                other => other,
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let content = parsed.text();
        if content.is_empty() {
            return Err(Error::InvalidResponse(
                "response contained no text blocks".to_string(),
            ));
        }

        Ok(ModelResponse {
            content,
            model: if parsed.model.is_empty() {
                request.model
            } else {
                parsed.model
            },
            stop_reason: parsed.stop_reason,
        })
    }

    async fn health(&self) -> Result<()> {
        let url = self.config.endpoint("/health");
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::from_transport(&e, 5_000))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Unavailable(format!(
                "health check returned HTTP {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let messages = vec![Message::user("hi"), Message::assistant("hello"), Message::user("2+2?")];
        let body = MessagesRequest {
            model: "claude-3-5-haiku-20241022",
            messages: &messages,
            max_tokens: 512,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "claude-3-5-haiku-20241022");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][1]["role"], "assistant");
    }

    #[test]
    fn test_text_blocks_concatenated_in_order() {
        let raw = r#"{
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "world"}
            ],
            "stop_reason": "end_turn"
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Hello, world");
        assert_eq!(parsed.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = BackendConfig::new("http://localhost:8082").with_api_key("sk-ant-REDACTED");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("1234567890"));
        assert!(debug_str.contains("sk-a...ghij"));
    }

    #[test]
    fn test_empty_key_is_none() {
        let config = BackendConfig::default().with_api_key("");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = BackendConfig::new("http://proxy:8082/");
        assert_eq!(config.endpoint("/v1/messages"), "http://proxy:8082/v1/messages");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            MessagesApiClient::new(BackendConfig::new("  ")),
            Err(Error::NotConfigured(_))
        ));
    }
}
