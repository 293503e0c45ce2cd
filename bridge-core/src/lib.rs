//! # bridge-core
//!
//! Core types and traits for the chat bridge: [`Messenger`], [`Handler`], [`InboundEvent`], conversation types,
//! the error taxonomy, and tracing initialization. Transport-agnostic; used by bridge-lark, handler-chain and lark-bot.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Messenger;
pub use error::{BridgeError, DispatchError, HandlerError, Result};
pub use logger::{init_console_tracing, init_tracing};
pub use types::{
    ConversationKind, ConversationPage, ConversationSnapshot, Handler, HandlerResponse,
    InboundEvent, OutboundContent, SendReceipt, TEXT_KIND,
};
