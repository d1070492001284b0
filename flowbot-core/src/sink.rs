//! Outbound chat abstraction.
//!
//! [`ChatSink`] covers the three calls the coalescer makes against a chat
//! platform. flowbot-telegram implements it over the Telegram Bot API; tests
//! substitute a recording mock.

use async_trait::async_trait;

use crate::error::Result;

/// Outbound messaging surface driven by the coalescer.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Sends a new message to the chat and returns its id for later edits.
    /// The id is transport-specific (for Telegram, the numeric message id).
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String>;

    /// Replaces the full text of an already-sent message.
    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()>;

    /// Shows a typing indicator in the chat. Best effort; callers log failures
    /// and carry on.
    async fn send_typing(&self, chat_id: i64) -> Result<()>;
}
