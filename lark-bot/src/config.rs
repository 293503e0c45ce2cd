//! Application config loaded from environment variables. Call validate() after load() to fail fast before init.

use anyhow::{Context, Result};
use bridge_lark::LarkConfig;
use std::env;

/// Store location when DATABASE_PATH is unset.
pub const DEFAULT_DATABASE_PATH: &str = "data/lark_bridge.db";
const DEFAULT_LOG_FILE: &str = "logs/lark-bridge.log";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_APP_ENV: &str = "development";
const DEFAULT_BROADCAST_TEXT: &str = "helloworld";
const DEFAULT_CHAT_PAGE_SIZE: u32 = 50;
const MAX_CHAT_PAGE_SIZE: u32 = 100;

/// Bot config: Lark connection plus local storage, logging and HTTP settings.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub lark: LarkConfig,
    /// DATABASE_PATH
    pub database_path: String,
    /// LOG_FILE
    pub log_file: String,
    /// PORT, serves the webhook and the HTTP API
    pub port: u16,
    /// APP_ENV
    pub app_env: String,
    /// CHAT_PAGE_SIZE, clamped to 1..=100
    pub chat_page_size: u32,
    /// BROADCAST_TEXT, sent by /api/send-message when no content is given
    pub broadcast_text: String,
}

impl BotConfig {
    /// Loads from environment. APP_ID and APP_SECRET are required.
    pub fn load() -> Result<Self> {
        let lark = LarkConfig::from_env()?;
        let database_path = non_empty_var("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let log_file = non_empty_var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let port = match non_empty_var("PORT") {
            Some(p) => p
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", p))?,
            None => DEFAULT_PORT,
        };
        let app_env = non_empty_var("APP_ENV").unwrap_or_else(|| DEFAULT_APP_ENV.to_string());
        let chat_page_size = non_empty_var("CHAT_PAGE_SIZE")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_CHAT_PAGE_SIZE)
            .clamp(1, MAX_CHAT_PAGE_SIZE);
        let broadcast_text =
            non_empty_var("BROADCAST_TEXT").unwrap_or_else(|| DEFAULT_BROADCAST_TEXT.to_string());

        Ok(Self {
            lark,
            database_path,
            log_file,
            port,
            app_env,
            chat_page_size,
            broadcast_text,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.lark.validate()?;
        if self.database_path.trim().is_empty() {
            anyhow::bail!("DATABASE_PATH must not be empty");
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Masks a secret for logging: first 4 + "..." + last 4, or "****" when 8 chars or shorter.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
