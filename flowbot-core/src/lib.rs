//! # flowbot-core
//!
//! Core of the streaming chat bot. [`StreamCoalescer`] turns an LLM token
//! stream into rate-limited sends and edits of a single chat message, talking
//! to the outside world only through the [`ChatSink`] and [`TokenSource`]
//! traits. Transport and model integrations live in flowbot-telegram and
//! flowbot-llm.

pub mod coalescer;
pub mod config;
pub mod error;
pub mod logger;
pub mod sink;
pub mod source;

pub use coalescer::{SessionOutcome, StreamCoalescer};
pub use config::CoalescerConfig;
pub use error::{CoalescerError, Result};
pub use logger::init_tracing;
pub use sink::ChatSink;
pub use source::{token_channel, ChannelTokenSource, TokenSender, TokenSource};
