//! Handler that persists inbound messages to storage in before().

use async_trait::async_trait;
use bridge_core::{Handler, HandlerError, InboundEvent, Result};
use storage::{MessageStore, NewMessage};
use tracing::{error, info, instrument, warn};

/// Upserts each inbound message into the [`MessageStore`]; always continues, even when the write fails.
#[derive(Clone)]
pub struct PersistenceHandler {
    store: MessageStore,
}

impl PersistenceHandler {
    pub fn new(store: MessageStore) -> Self {
        Self { store }
    }

    fn to_record(event: &InboundEvent) -> std::result::Result<NewMessage, HandlerError> {
        let conversation_id = event
            .conversation_id
            .as_deref()
            .ok_or(HandlerError::MissingField("conversation_id"))?;
        let platform_message_id = event
            .platform_message_id
            .as_deref()
            .ok_or(HandlerError::MissingField("platform_message_id"))?;
        Ok(NewMessage::inbound(
            conversation_id,
            platform_message_id,
            event.message_kind.clone().unwrap_or_default(),
            event.body.clone().unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl Handler for PersistenceHandler {
    #[instrument(skip(self, event))]
    async fn before(&self, event: &InboundEvent) -> Result<bool> {
        let record = match Self::to_record(event) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Skipping persistence");
                return Ok(true);
            }
        };

        info!(
            conversation_id = %record.conversation_id,
            platform_message_id = %record.platform_message_id,
            kind = %record.kind,
            "step: PersistenceHandler before, saving message"
        );

        match self.store.put(&record).await {
            Ok(outcome) => info!(
                platform_message_id = %record.platform_message_id,
                outcome = ?outcome,
                "step: PersistenceHandler before done, message saved"
            ),
            Err(e) => error!(
                error = %e,
                platform_message_id = %record.platform_message_id,
                "Failed to save message"
            ),
        }

        Ok(true)
    }
}
