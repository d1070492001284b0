//! Polling runner: receives Telegram updates via teloxide REPL and feeds the
//! streaming handler. Calls `get_me()` once at startup to confirm the bot
//! identity.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, info, instrument};

use crate::config::BotConfig;
use crate::handler::StreamChatHandler;
use crate::sink::TelegramSink;
use crate::types::IncomingMessage;
use flowbot_llm::LlmClient;

/// Builds the teloxide `Bot` from config, applying the custom API URL when one
/// is set and parses; otherwise falls back to the default endpoint.
pub fn build_bot(config: &BotConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token.clone());
    if let Some(ref url_str) = config.telegram_api_url {
        match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        }
    } else {
        bot
    }
}

/// **Entry point.** Runs long polling until shutdown. Each text update is
/// converted to an [`IncomingMessage`] and queued with the handler; non-text
/// updates are logged and skipped.
#[instrument(skip(config, llm))]
pub async fn run_polling(config: BotConfig, llm: Arc<dyn LlmClient>) -> Result<()> {
    config.validate()?;

    let bot = build_bot(&config);
    if let Ok(me) = bot.get_me().await {
        info!(username = ?me.user.username, "Bot identity confirmed before repl");
    }

    let sink: Arc<dyn flowbot_core::ChatSink> = Arc::new(TelegramSink::new(bot.clone()));
    let handler = Arc::new(StreamChatHandler::new(sink, llm, config.coalescer_config()));

    teloxide::repl(
        bot,
        move |_bot: Bot, msg: teloxide::types::Message| {
            let handler = handler.clone();

            async move {
                match IncomingMessage::from_telegram(&msg) {
                    Some(incoming) => {
                        info!(
                            user_id = incoming.user_id,
                            chat_id = incoming.chat_id,
                            text_len = incoming.text.len(),
                            "Received message"
                        );
                        handler.enqueue(incoming);
                    }
                    None => {
                        info!(chat_id = msg.chat.id.0, "Received non-text message, skipping");
                    }
                }

                Ok(())
            }
        },
    )
    .await;

    Ok(())
}
