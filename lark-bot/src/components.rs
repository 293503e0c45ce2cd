//! Component factory: builds BridgeComponents from config. Isolates assembly logic from runner and CLI.

use anyhow::{Context, Result};
use bridge_core::Messenger;
use bridge_lark::LarkClient;
use std::sync::Arc;
use storage::MessageStore;
use tracing::{info, instrument};

use crate::broadcast::BroadcastDispatcher;
use crate::config::BotConfig;
use crate::router::EventRouter;
use crate::tracker::ConversationTracker;

/// Everything the event path and the broadcast path share.
#[derive(Clone)]
pub struct BridgeComponents {
    pub store: MessageStore,
    pub messenger: Arc<dyn Messenger>,
    pub tracker: ConversationTracker,
    pub router: EventRouter,
    pub dispatcher: Arc<BroadcastDispatcher>,
}

/// Opens the message store and builds the Lark client, then wires the rest.
#[instrument(skip(config))]
pub async fn build_components(config: &BotConfig) -> Result<BridgeComponents> {
    info!(database_path = %config.database_path, "Opening message store");
    let store = MessageStore::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open message store at {}", config.database_path))?;
    let client = LarkClient::new(config.lark.clone()).context("Failed to build Lark client")?;
    Ok(assemble(config, store, Arc::new(client)))
}

/// Wires router and dispatcher around an existing store and messenger (tests inject a mock messenger here).
pub fn assemble(config: &BotConfig, store: MessageStore, messenger: Arc<dyn Messenger>) -> BridgeComponents {
    let tracker = ConversationTracker::new();
    let router = EventRouter::new(tracker.clone(), store.clone(), messenger.clone());
    let dispatcher = Arc::new(
        BroadcastDispatcher::new(messenger.clone(), tracker.clone(), store.clone())
            .with_page_size(config.chat_page_size),
    );
    BridgeComponents {
        store,
        messenger,
        tracker,
        router,
        dispatcher,
    }
}
