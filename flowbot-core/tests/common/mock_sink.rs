//! Mock implementation of [`flowbot_core::ChatSink`] for integration tests.
//!
//! Records every sink call on an unbounded channel so tests can assert on call
//! order and content without a real chat platform. Failure switches let tests
//! drive the transient-failure and teardown-failure paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use flowbot_core::{ChatSink, CoalescerError, Result};
use tokio::sync::mpsc;

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Send {
        chat_id: i64,
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
    /// True for sends and edits, the calls that change visible message text.
    pub fn is_visible(&self) -> bool {
        !matches!(self, SinkCall::Typing { .. })
    }
}

/// Mock sink that records calls and hands out message ids "1", "2", ... per
/// send. Failed calls return an error without being recorded.
pub struct MockSink {
    calls_tx: mpsc::UnboundedSender<SinkCall>,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
}

impl MockSink {
    /// Creates a MockSink and returns the receiver for recorded calls.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<SinkCall>) {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            calls_tx,
            next_id: AtomicU64::new(1),
            fail_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
        });
        (sink, calls_rx)
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatSink for MockSink {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CoalescerError::Sink("mock send failure".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let _ = self.calls_tx.send(SinkCall::Send {
            chat_id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(CoalescerError::Sink("mock edit failure".to_string()));
        }
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
