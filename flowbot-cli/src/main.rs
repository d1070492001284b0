//! flowbot: entry point. Wires config, logging, the LLM client, and the
//! Telegram polling runner.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cli::{Cli, Commands};
use flowbot_core::init_tracing;
use flowbot_llm::{EnvLlmConfig, LlmClient, OpenAiLlmClient};
use flowbot_telegram::{run_polling, BotConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run(token).await,
    }
}

/// Loads config, initializes logging, builds the LLM client, and polls until
/// shutdown.
async fn run(token: Option<String>) -> Result<()> {
    let config = BotConfig::load(token)?;
    config.validate()?;

    if let Some(parent) = std::path::Path::new(&config.log_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
    }
    init_tracing(&config.log_file)?;

    let llm_config = EnvLlmConfig::from_env()?;
    if let Some(ref prompt) = llm_config.llm_system_prompt {
        let prefix: String = prompt.chars().take(50).collect();
        info!(len = prompt.len(), prefix = %prefix, "Using custom system prompt from env");
    } else {
        warn!("No SYSTEM_PROMPT/LLM_SYSTEM_PROMPT in env; using default (plain text, no Markdown)");
    }

    let llm: Arc<dyn LlmClient> = Arc::new(
        OpenAiLlmClient::with_base_url(
            llm_config.openai_api_key.clone(),
            llm_config.openai_base_url.clone(),
        )
        .with_model(llm_config.llm_model.clone())
        .with_system_prompt_opt(llm_config.llm_system_prompt.clone()),
    );

    info!(
        model = %llm_config.llm_model,
        edit_interval_secs = config.edit_interval_secs,
        typing_interval_secs = config.typing_interval_secs,
        first_token_threshold = config.first_token_threshold,
        "Starting flowbot"
    );

    run_polling(config, llm).await
}
