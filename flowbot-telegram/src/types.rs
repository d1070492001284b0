//! Incoming message model: the slice of a Telegram update the bot acts on.

use chrono::{DateTime, Utc};

/// One incoming text message, reduced to the fields the streaming handler
/// needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// Converts a Telegram update into the handler view. Returns `None` for
    /// updates without a text body (stickers, photos, service messages).
    pub fn from_telegram(msg: &teloxide::types::Message) -> Option<Self> {
        let text = msg.text()?.to_string();
        let (user_id, username) = match msg.from.as_ref() {
            Some(user) => (user.id.0 as i64, user.username.clone()),
            None => (0, None),
        };
        Some(Self {
            chat_id: msg.chat.id.0,
            user_id,
            username,
            text,
            received_at: Utc::now(),
        })
    }
}
