//! Event router: one inbound event in, tracker update + persisted message + one reply out.
//!
//! Built as a handler chain (tracking → persistence → reply). Routing never fails from the caller's
//! point of view; every failure is logged and absorbed.

use bridge_core::{HandlerResponse, InboundEvent, Messenger};
use handler_chain::HandlerChain;
use std::sync::Arc;
use storage::MessageStore;
use tracing::{error, info, instrument};

use crate::handlers::{PersistenceHandler, ReplyHandler, TrackingHandler};
use crate::tracker::ConversationTracker;

#[derive(Clone)]
pub struct EventRouter {
    chain: HandlerChain,
}

impl EventRouter {
    pub fn new(
        tracker: ConversationTracker,
        store: MessageStore,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let chain = HandlerChain::new()
            .add_handler(Arc::new(TrackingHandler::new(tracker)))
            .add_handler(Arc::new(PersistenceHandler::new(store.clone())))
            .add_handler(Arc::new(ReplyHandler::new(messenger, store)));
        Self { chain }
    }

    /// Router over a custom chain.
    pub fn with_chain(chain: HandlerChain) -> Self {
        Self { chain }
    }

    /// Processes one event to completion. Always returns a response, never an error.
    #[instrument(skip(self, event), fields(
        conversation_id = ?event.conversation_id,
        platform_message_id = ?event.platform_message_id,
    ))]
    pub async fn route(&self, event: &InboundEvent) -> HandlerResponse {
        match self.chain.handle(event).await {
            Ok(response) => {
                info!(response = ?response, "step: event routed");
                response
            }
            Err(e) => {
                error!(error = %e, "Handler chain failed");
                HandlerResponse::Stop
            }
        }
    }
}
