//! Recording [`ChatSink`] mock shared by the handler tests.
//!
//! Every call is sent to an unbounded channel held by the test, so tests can
//! wait for specific visible output and then assert on the full call history
//! without hitting Telegram.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use flowbot_core::{ChatSink, Result};
use tokio::sync::mpsc;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Send {
        chat_id: i64,
        message_id: String,
        text: String,
    },
    Edit {
        chat_id: i64,
        message_id: String,
        text: String,
    },
    Typing {
        chat_id: i64,
    },
}

impl SinkCall {
    /// The text this call put on screen, or `None` for typing pings.
    pub fn visible_text(&self) -> Option<&str> {
        match self {
            SinkCall::Send { text, .. } | SinkCall::Edit { text, .. } => Some(text),
            SinkCall::Typing { .. } => None,
        }
    }
}

/// [`ChatSink`] that records every call and assigns message ids "1", "2", ...
pub struct MockSink {
    calls_tx: mpsc::UnboundedSender<SinkCall>,
    next_id: AtomicU64,
}

impl MockSink {
    /// Creates the mock plus the receiver for its call records.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<SinkCall>) {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                calls_tx,
                next_id: AtomicU64::new(1),
            }),
            calls_rx,
        )
    }
}

#[async_trait]
impl ChatSink for MockSink {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let _ = self.calls_tx.send(SinkCall::Send {
            chat_id,
            message_id: message_id.clone(),
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()> {
        let _ = self.calls_tx.send(SinkCall::Edit {
            chat_id,
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        let _ = self.calls_tx.send(SinkCall::Typing { chat_id });
        Ok(())
    }
}
