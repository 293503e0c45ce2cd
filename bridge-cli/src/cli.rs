//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lark_bot::config::DEFAULT_DATABASE_PATH;
use lark_bot::BotConfig;

#[derive(Parser, Debug)]
#[command(name = "lark-bridge")]
#[command(about = "Lark chat bridge: run, broadcast, history, trim", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the webhook and HTTP API until Ctrl-C / SIGTERM (config from env).
    Run,
    /// Send a text message to every conversation the bot has joined and print the report.
    Broadcast {
        /// Defaults to BROADCAST_TEXT.
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Print stored messages of a conversation, oldest first.
    History {
        #[arg(short, long)]
        conversation: String,
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// Keep only the N most recent stored messages of a conversation.
    Trim {
        #[arg(short, long)]
        conversation: String,
        #[arg(short, long)]
        keep: u32,
    },
}

/// Load BotConfig from environment; APP_ID and APP_SECRET must be set.
pub fn load_config() -> Result<BotConfig> {
    BotConfig::load()
}

/// DATABASE_PATH for commands that only touch the store and need no Lark credentials.
pub fn database_path() -> String {
    std::env::var("DATABASE_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
}
