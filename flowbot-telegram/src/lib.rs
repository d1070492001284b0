//! # flowbot-telegram
//!
//! Telegram layer for the streaming bot.
//!
//! [`TelegramSink`] implements [`flowbot_core::ChatSink`] over the Bot API,
//! [`StreamChatHandler`] queues incoming messages per chat and streams LLM
//! replies into edited messages, and [`run_polling`] wires both into teloxide
//! long polling.
//!
//! # Entry points (public API)
//!
//! - **[`run_polling`]** – Builds the bot from [`BotConfig`] and polls until
//!   shutdown.
//! - **[`StreamChatHandler`]** – Per-chat serial queues over streaming
//!   sessions; usable with any [`flowbot_core::ChatSink`].
//! - **[`TelegramSink`]** – Send / edit / typing against the Telegram Bot API
//!   with rate-limit and "not modified" tolerance.

pub mod config;
pub mod handler;
pub mod runner;
pub mod sink;
pub mod types;

pub use config::BotConfig;
pub use handler::StreamChatHandler;
pub use runner::{build_bot, run_polling};
pub use sink::{is_message_not_modified_error, TelegramSink};
pub use types::IncomingMessage;
