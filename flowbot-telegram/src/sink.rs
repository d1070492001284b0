//! Telegram-backed [`ChatSink`].
//!
//! Wraps teloxide send / edit / typing calls. Telegram-specific tolerances
//! live here so the coalescer stays platform-neutral: an edit rejected with
//! "message is not modified" counts as success, and an edit rejected with
//! "Retry after Ns" is retried once after the advertised wait.

use async_trait::async_trait;
use flowbot_core::{ChatSink, CoalescerError, Result};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, MessageId};
use tracing::warn;

/// True when Telegram rejected an edit because the text is unchanged.
pub fn is_message_not_modified_error(error_str: &str) -> bool {
    error_str.contains("message is not modified") || error_str.contains("exactly the same")
}

/// Extracts the wait from a "Retry after Ns" rate-limit error, if present.
fn extract_retry_after_seconds(error_str: &str) -> Option<u64> {
    let marker = "Retry after ";
    let start = error_str.find(marker)? + marker.len();
    let rest = &error_str[start..];
    let end = rest.find('s')?;
    rest[..end].trim().parse().ok()
}

/// Parses a message id handle back into Telegram's numeric id.
fn parse_message_id(message_id: &str) -> Result<i32> {
    message_id
        .parse::<i32>()
        .map_err(|_| CoalescerError::Sink(format!("Invalid message id: {}", message_id)))
}

/// [`ChatSink`] over the Telegram Bot API.
pub struct TelegramSink {
    bot: teloxide::Bot,
}

impl TelegramSink {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    async fn edit_once(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await
            .map_err(|e| CoalescerError::Sink(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ChatSink for TelegramSink {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| CoalescerError::Sink(e.to_string()))?;
        Ok(sent.id.to_string())
    }

    async fn edit_message(&self, chat_id: i64, message_id: &str, text: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        match self.edit_once(chat_id, id, text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let error_str = e.to_string();
                if is_message_not_modified_error(&error_str) {
                    return Ok(());
                }
                if let Some(retry_secs) = extract_retry_after_seconds(&error_str) {
                    warn!(chat_id, retry_secs, "Edit rate-limited, retrying once");
                    tokio::time::sleep(std::time::Duration::from_secs(retry_secs)).await;
                    return self.edit_once(chat_id, id, text).await;
                }
                Err(e)
            }
        }
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| CoalescerError::Sink(e.to_string()))?;
        Ok(())
    }
}
