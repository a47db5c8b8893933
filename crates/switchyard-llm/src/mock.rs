//! Mock model backend for testing
//!
//! Returns queued results in order, then a default echo reply once the queue
//! is empty. Every request is recorded so tests can inspect what was sent.

use crate::backend::{ModelBackend, ModelRequest, ModelResponse};
use crate::error::Result;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted backend
#[derive(Clone, Default)]
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock with an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering each request
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.push_result(Ok(text.into()));
    }

    /// Queue an arbitrary result
    pub fn push_result(&self, result: Result<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, request: ModelRequest) -> Result<ModelResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match queued {
            Some(result) => result?,
            None => format!(
                "mock reply to: {}",
                request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default()
            ),
        };

        Ok(ModelResponse {
            content,
            model: request.model,
            stop_reason: Some("end_turn".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::message::Message;

    #[tokio::test]
    async fn test_queued_then_default() {
        let mock = MockBackend::new();
        mock.push_text("first");
        mock.push_result(Err(Error::Unavailable("down".to_string())));

        let req = ModelRequest::new("m", vec![Message::user("ping")]);
        assert_eq!(mock.invoke(req.clone()).await.unwrap().content, "first");
        tokio_test::assert_err!(mock.invoke(req.clone()).await);
        assert_eq!(
            mock.invoke(req).await.unwrap().content,
            "mock reply to: ping"
        );
        assert_eq!(mock.call_count(), 3);
    }
}
