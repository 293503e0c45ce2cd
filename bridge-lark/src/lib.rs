//! # bridge-lark
//!
//! Lark/Feishu transport layer: payload adapter, [`bridge_core::Messenger`] implementation over the REST API,
//! connection config, and the webhook event source. No persistence or routing logic.

mod adapters;
mod client;
mod config;
pub mod webhook;

pub use adapters::{callback_token, parse_event_payload, MESSAGE_RECEIVE_EVENT};
pub use client::LarkClient;
pub use config::{LarkConfig, FEISHU_BASE_URL, LARK_BASE_URL};
pub use webhook::{WebhookState, WEBHOOK_PATH};
