//! # bridge-cli
//!
//! Argument parsing and config loading for the `lark-bridge` binary.

pub mod cli;

pub use cli::{database_path, load_config, Cli, Commands};
pub use lark_bot::BotConfig;
