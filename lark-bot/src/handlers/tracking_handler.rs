//! Handler that records the event's conversation as the active one in before().

use async_trait::async_trait;
use bridge_core::{Handler, InboundEvent, Result};
use tracing::{info, instrument, warn};

use crate::tracker::ConversationTracker;

#[derive(Clone)]
pub struct TrackingHandler {
    tracker: ConversationTracker,
}

impl TrackingHandler {
    pub fn new(tracker: ConversationTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Handler for TrackingHandler {
    #[instrument(skip(self, event))]
    async fn before(&self, event: &InboundEvent) -> Result<bool> {
        match event.conversation_id.as_deref() {
            Some(conversation_id) => {
                self.tracker.update(conversation_id, event.kind()).await;
                info!(
                    conversation_id = %conversation_id,
                    conversation_kind = %event.kind(),
                    "step: TrackingHandler before, conversation tracked"
                );
            }
            None => warn!("Event has no conversation id; tracker not updated"),
        }
        Ok(true)
    }
}
