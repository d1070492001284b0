//! OpenAI-backed [`LlmClient`]: wraps async-openai and prepends the system
//! prompt.

use std::sync::Arc;

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig, types::ChatCompletionRequestMessage,
    types::ChatCompletionRequestSystemMessageArgs, types::CreateChatCompletionRequestArgs, Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::instrument;

use crate::{chat_message_to_openai, ChatMessage, LlmClient, StreamChunk, StreamChunkCallback};

/// Default system prompt: plain text only, suitable for sending straight to
/// Telegram.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Do not use Markdown or any formatting \
symbols (such as *, _, `, #). Reply in plain text that can be sent to a chat \
as-is.";

/// [`LlmClient`] over an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiLlmClient {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Arc::new(Client::with_config(config)),
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: None,
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: None,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_system_prompt_opt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    fn system_content(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Builds the API message list: system prompt first, then the
    /// conversation.
    fn openai_messages(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut out: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_content().to_string())
                .build()?
                .into(),
        ];
        for msg in messages {
            out.push(chat_message_to_openai(msg)?);
        }
        Ok(out)
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    #[instrument(skip(self, messages))]
    async fn reply(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(self.openai_messages(&messages)?)
            .build()?;

        let response = self.client.chat().create(request).await?;
        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone().unwrap_or_default()),
            None => anyhow::bail!("No response from model"),
        }
    }

    #[instrument(skip(self, messages, callback))]
    async fn stream_reply(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(self.openai_messages(&messages)?)
            .build()?;

        let mut stream = self.client.chat().create_stream(request).await?;

        // Every content delta is forwarded at once; pacing is the consumer's
        // concern, not the client's.
        let mut full_response = String::new();
        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| anyhow::anyhow!("Stream error: {}", e))?;
            if let Some(choice) = chunk.choices.first() {
                if let Some(content) = &choice.delta.content {
                    if !content.is_empty() {
                        full_response.push_str(content);
                        callback(StreamChunk {
                            content: content.clone(),
                            done: choice.finish_reason.is_some(),
                        })
                        .await?;
                    }
                }
            }
        }

        Ok(full_response)
    }
}
