//! Bot configuration loaded from environment variables.

use anyhow::{Context, Result};
use flowbot_core::CoalescerConfig;
use std::env;

/// Telegram-side settings: connection, streaming pace, logging.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// Min interval (sec) between message edits when streaming; limits Telegram API rate
    pub edit_interval_secs: u64,
    /// Interval (sec) between typing notifications before the first visible send
    pub typing_interval_secs: u64,
    /// Tokens to accumulate before the first send is forced
    pub first_token_threshold: u32,
    /// Log file path
    pub log_file: String,
}

impl BotConfig {
    /// Loads settings from the environment. An explicit `token` takes
    /// precedence over `BOT_TOKEN`.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };

        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();

        let edit_interval_secs = env::var("TELEGRAM_EDIT_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let typing_interval_secs = env::var("TELEGRAM_TYPING_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let first_token_threshold = env::var("FIRST_TOKEN_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/flowbot.log".to_string());

        Ok(Self {
            bot_token,
            telegram_api_url,
            edit_interval_secs,
            typing_interval_secs,
            first_token_threshold,
            log_file,
        })
    }

    /// Validate config: URL shape and pacing bounds, checked before the bot
    /// starts.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        self.coalescer_config().validate()?;
        Ok(())
    }

    /// Pacing settings in the form the streaming session consumes them.
    pub fn coalescer_config(&self) -> CoalescerConfig {
        CoalescerConfig::from_secs(
            self.edit_interval_secs,
            self.typing_interval_secs,
            self.first_token_threshold,
        )
    }
}
