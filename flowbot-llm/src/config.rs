//! LLM configuration loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Connection settings for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    /// Custom system prompt; `None` falls back to
    /// [`DEFAULT_SYSTEM_PROMPT`](crate::DEFAULT_SYSTEM_PROMPT).
    pub llm_system_prompt: Option<String>,
}

impl EnvLlmConfig {
    /// Loads from environment variables. `OPENAI_API_KEY` is required;
    /// `OPENAI_BASE_URL` and `MODEL` have OpenAI defaults; the system prompt
    /// comes from `LLM_SYSTEM_PROMPT` or `SYSTEM_PROMPT`, blank values
    /// ignored.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let llm_model = env::var("MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let llm_system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .or_else(|_| env::var("SYSTEM_PROMPT"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            openai_api_key,
            openai_base_url,
            llm_model,
            llm_system_prompt,
        })
    }
}
