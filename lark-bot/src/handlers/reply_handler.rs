//! Handler that answers every inbound message: p2p conversations get a new message, groups get a
//! reply threaded on the inbound message.

use async_trait::async_trait;
use bridge_core::{
    BridgeError, ConversationKind, Handler, HandlerError, HandlerResponse, InboundEvent, Messenger,
    OutboundContent, Result, SendReceipt,
};
use std::sync::Arc;
use storage::{MessageStore, NewMessage};
use tracing::{error, info, instrument, warn};

use crate::reply::{compose_reply, display_text, reply_lines};

pub struct ReplyHandler {
    messenger: Arc<dyn Messenger>,
    store: MessageStore,
}

impl ReplyHandler {
    pub fn new(messenger: Arc<dyn Messenger>, store: MessageStore) -> Self {
        Self { messenger, store }
    }

    async fn dispatch(
        &self,
        event: &InboundEvent,
        content: &OutboundContent,
    ) -> std::result::Result<(String, SendReceipt), DispatchFailure> {
        match event.kind() {
            ConversationKind::P2p => {
                let conversation_id = event
                    .conversation_id
                    .as_deref()
                    .ok_or(DispatchFailure::NoTarget(HandlerError::MissingField("conversation_id")))?;
                let receipt = self
                    .messenger
                    .create_message(conversation_id, content)
                    .await
                    .map_err(DispatchFailure::Send)?;
                Ok((conversation_id.to_string(), receipt))
            }
            ConversationKind::Group => {
                let message_id = event
                    .platform_message_id
                    .as_deref()
                    .ok_or(DispatchFailure::NoTarget(HandlerError::MissingField(
                        "platform_message_id",
                    )))?;
                let receipt = self
                    .messenger
                    .reply_message(message_id, content)
                    .await
                    .map_err(DispatchFailure::Send)?;
                Ok((event.conversation_id.clone().unwrap_or_default(), receipt))
            }
        }
    }

    /// Records the bot's own message when the platform told us its id.
    async fn persist_outbound(&self, conversation_id: &str, receipt: &SendReceipt, content: &OutboundContent) {
        let Some(message_id) = receipt.message_id.as_deref() else {
            return;
        };
        if conversation_id.is_empty() {
            warn!(platform_message_id = %message_id, "Reply sent without a known conversation; not persisted");
            return;
        }
        let record = NewMessage::outbound(conversation_id, message_id, &content.msg_type, &content.content);
        if let Err(e) = self.store.put(&record).await {
            error!(error = %e, platform_message_id = %message_id, "Failed to save outbound reply");
        }
    }
}

enum DispatchFailure {
    NoTarget(HandlerError),
    Send(BridgeError),
}

#[async_trait]
impl Handler for ReplyHandler {
    #[instrument(skip(self, event))]
    async fn handle(&self, event: &InboundEvent) -> Result<HandlerResponse> {
        let text = display_text(event.message_kind.as_deref(), event.body.as_deref());
        let content = compose_reply(&text);

        info!(
            conversation_id = ?event.conversation_id,
            platform_message_id = ?event.platform_message_id,
            conversation_kind = %event.kind(),
            "step: ReplyHandler handle, sending reply"
        );

        match self.dispatch(event, &content).await {
            Ok((conversation_id, receipt)) => {
                info!(
                    conversation_id = %conversation_id,
                    reply_message_id = ?receipt.message_id,
                    "step: ReplyHandler handle done, reply sent"
                );
                self.persist_outbound(&conversation_id, &receipt, &content).await;
                Ok(HandlerResponse::Reply(reply_lines(&text).join("\n")))
            }
            Err(DispatchFailure::NoTarget(e)) => {
                warn!(error = %e, conversation_kind = %event.kind(), "No reply target; reply skipped");
                Ok(HandlerResponse::Stop)
            }
            Err(DispatchFailure::Send(e)) => {
                error!(
                    error = %e,
                    code = ?e.code(),
                    request_id = ?e.request_id(),
                    conversation_id = ?event.conversation_id,
                    "Failed to send reply"
                );
                Ok(HandlerResponse::Stop)
            }
        }
    }
}
