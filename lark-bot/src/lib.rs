//! # Lark bridge application
//!
//! Wires handler-chain, storage and bridge-lark into the running bridge: conversation tracker,
//! event router, broadcast dispatcher, HTTP API, config and the cancellable runner.

pub mod api;
pub mod broadcast;
pub mod components;
pub mod config;
pub mod handlers;
pub mod reply;
pub mod router;
pub mod runner;
pub mod tracker;

pub use broadcast::{
    BroadcastDispatcher, BroadcastReport, ConversationPages, ConversationResult, SendStatus,
    DEFAULT_PAGE_SIZE,
};
pub use components::{assemble, build_components, BridgeComponents};
pub use config::{mask_secret, BotConfig};
pub use handlers::{PersistenceHandler, ReplyHandler, TrackingHandler};
pub use reply::{compose_reply, fallback_text, parse_text, ParseFailure, ParsedText, FALLBACK_TEXT};
pub use router::EventRouter;
pub use runner::{consume_events, run_bridge};
pub use tracker::ConversationTracker;
