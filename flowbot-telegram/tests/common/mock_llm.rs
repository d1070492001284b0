//! Scripted [`LlmClient`] mock for the handler tests.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use flowbot_llm::{ChatMessage, LlmClient, MessageRole, StreamChunk, StreamChunkCallback};

/// [`LlmClient`] that streams `"re: "` followed by the last user message, one
/// fragment at a time, so tests can tell replies apart. Supports an optional
/// per-fragment delay and a scripted failure.
pub struct MockLlm {
    fragment_delay: Duration,
    fail_at: Option<usize>,
}

impl MockLlm {
    pub fn echoing() -> Self {
        Self {
            fragment_delay: Duration::ZERO,
            fail_at: None,
        }
    }

    /// Sleeps this long before emitting each fragment.
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// Fails with "mock stream failure" instead of emitting fragment `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    fn fragments_for(messages: &[ChatMessage]) -> Vec<String> {
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        vec!["re: ".to_string(), question]
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn reply(&self, messages: Vec<ChatMessage>) -> Result<String> {
        Ok(Self::fragments_for(&messages).concat())
    }

    async fn stream_reply(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String> {
        let fragments = Self::fragments_for(&messages);
        let mut full_response = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            if self.fail_at == Some(i) {
                anyhow::bail!("mock stream failure");
            }
            if !self.fragment_delay.is_zero() {
                tokio::time::sleep(self.fragment_delay).await;
            }
            full_response.push_str(fragment);
            callback(StreamChunk {
                content: fragment.clone(),
                done: false,
            })
            .await?;
        }
        Ok(full_response)
    }
}
