//! CLI parser for the flowbot binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flowbot")]
#[command(about = "Streaming Telegram chatbot backed by an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
}
