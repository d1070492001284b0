//! # flowbot-llm
//!
//! LLM integration: the [`LlmClient`] trait, an OpenAI-compatible
//! implementation, and [`spawn_reply_source`], the bridge that turns a
//! streamed completion into a [`flowbot_core::TokenSource`] for the
//! coalescer.
//!
//! The stream method takes a boxed callback so that [`LlmClient`] stays
//! object-safe (dyn compatible).

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

pub mod config;
pub mod message;
mod openai;
mod source;

pub use config::EnvLlmConfig;
pub use message::{ChatMessage, MessageRole};
pub use openai::{OpenAiLlmClient, DEFAULT_SYSTEM_PROMPT};
pub use source::spawn_reply_source;

/// A chunk of streamed model output. `done` is set when the chunk carries the
/// finish reason.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
}

/// Type-erased callback for stream chunks, keeping [`LlmClient`] dyn
/// compatible.
pub type StreamChunkCallback =
    dyn FnMut(StreamChunk) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send;

/// LLM client interface: completion or streamed completion from a list of
/// chat messages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the full model reply for the given messages.
    async fn reply(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Streamed completion: invokes `callback` for every content delta as it
    /// arrives and returns the full reply text.
    async fn stream_reply(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String>;
}

/// Converts a single [`ChatMessage`] into the OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
