//! Console transport
//!
//! Writes outbound operations as plain lines so the router can be driven
//! from a terminal:
//!
//! ```text
//! [msg-1] Hello!
//! [msg-1 edited] Hi.
//! [msg-1] react: 🤐 📜 🔄 ❓ 📊 👍 👎
//! ```
//!
//! Reactions are typed back as `!msg-1 📜` (see [`crate::parse_console_line`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use switchyard_core::MessageTransport;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Error;

/// Line-oriented transport over any async writer
pub struct ConsoleTransport<W> {
    writer: Arc<Mutex<W>>,
    next_id: AtomicU64,
}

impl ConsoleTransport<Stdout> {
    /// Transport writing to standard output
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Shared handle to the underlying writer
    #[must_use]
    pub fn writer(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.writer)
    }

    async fn write_line(&self, line: String) -> crate::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await.map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl<W> MessageTransport for ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, chat_id: &str, text: &str) -> switchyard_core::Result<String> {
        let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(chat = %chat_id, message_id = %id, "console send");
        self.write_line(format!("[{}] {}", id, text)).await?;
        Ok(id)
    }

    async fn edit(&self, chat_id: &str, message_id: &str, text: &str) -> switchyard_core::Result<()> {
        debug!(chat = %chat_id, message_id = %message_id, "console edit");
        self.write_line(format!("[{} edited] {}", message_id, text))
            .await
            .map_err(Into::into)
    }

    async fn set_reactions(
        &self,
        _chat_id: &str,
        message_id: &str,
        symbols: &[String],
    ) -> switchyard_core::Result<()> {
        if symbols.is_empty() {
            return Ok(());
        }
        self.write_line(format!("[{}] react: {}", message_id, symbols.join(" ")))
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn output(transport: &ConsoleTransport<Vec<u8>>) -> String {
        let writer = transport.writer();
        let bytes = writer.lock().await;
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_send_assigns_sequential_ids() {
        let transport = ConsoleTransport::new(Vec::new());
        let first = transport.send("console", "hello").await.unwrap();
        let second = transport.send("console", "again").await.unwrap();

        assert_eq!(first, "msg-1");
        assert_eq!(second, "msg-2");
        assert_eq!(output(&transport).await, "[msg-1] hello\n[msg-2] again\n");
    }

    #[tokio::test]
    async fn test_edit_and_reactions() {
        let transport = ConsoleTransport::new(Vec::new());
        let id = transport.send("console", "long answer").await.unwrap();
        tokio_test::assert_ok!(transport.edit("console", &id, "short").await);
        tokio_test::assert_ok!(
            transport
                .set_reactions("console", &id, &["🤐".to_string(), "📜".to_string()])
                .await
        );

        let out = output(&transport).await;
        assert!(out.contains("[msg-1 edited] short\n"));
        assert!(out.ends_with("[msg-1] react: 🤐 📜\n"));
    }

    #[tokio::test]
    async fn test_empty_reaction_set_writes_nothing() {
        let transport = ConsoleTransport::new(Vec::new());
        transport.set_reactions("console", "msg-9", &[]).await.unwrap();
        assert!(output(&transport).await.is_empty());
    }
}
