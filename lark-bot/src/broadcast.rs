//! Broadcast dispatcher: enumerate every joined conversation, send to each, report per-conversation
//! results. Also provides the default-target send to whichever conversation spoke last.

use bridge_core::{BridgeError, DispatchError, Messenger, OutboundContent, SendReceipt};
use serde::Serialize;
use std::sync::Arc;
use storage::{MessageStore, NewMessage};
use tracing::{error, info, instrument, warn};

use crate::tracker::ConversationTracker;

/// Conversations requested per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationResult {
    #[serde(rename = "chat_id")]
    pub conversation_id: String,
    pub status: SendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome of a broadcast. `results` follows listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<ConversationResult>,
}

impl BroadcastReport {
    fn record(&mut self, result: ConversationResult) {
        self.total += 1;
        match result.status {
            SendStatus::Success => self.success += 1,
            SendStatus::Failed => self.failed += 1,
        }
        self.results.push(result);
    }
}

/// Cursor over the platform's conversation listing. Finite and single-pass: once the platform
/// reports no further pages (or a page fails) it yields nothing more.
pub struct ConversationPages<'a> {
    messenger: &'a dyn Messenger,
    page_size: u32,
    page_token: Option<String>,
    done: bool,
}

impl<'a> ConversationPages<'a> {
    pub fn new(messenger: &'a dyn Messenger, page_size: u32) -> Self {
        Self {
            messenger,
            page_size,
            page_token: None,
            done: false,
        }
    }

    pub async fn next_page(&mut self) -> Option<Result<Vec<String>, BridgeError>> {
        if self.done {
            return None;
        }
        let page = match self
            .messenger
            .list_conversations(self.page_token.as_deref(), self.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        match (page.has_more, page.page_token) {
            (true, Some(token)) => self.page_token = Some(token),
            (true, None) => {
                warn!("Listing reports more pages but no page token; stopping");
                self.done = true;
            }
            (false, _) => self.done = true,
        }
        Some(Ok(page.conversation_ids))
    }
}

pub struct BroadcastDispatcher {
    messenger: Arc<dyn Messenger>,
    tracker: ConversationTracker,
    store: MessageStore,
    page_size: u32,
}

impl BroadcastDispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, tracker: ConversationTracker, store: MessageStore) -> Self {
        Self {
            messenger,
            tracker,
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every conversation the bot belongs to, in listing order. Any page failure discards what was gathered.
    #[instrument(skip(self))]
    pub async fn list_joined_conversations(&self) -> Result<Vec<String>, DispatchError> {
        let mut pages = ConversationPages::new(self.messenger.as_ref(), self.page_size);
        let mut conversation_ids = Vec::new();
        while let Some(page) = pages.next_page().await {
            let ids = page.map_err(|e| {
                error!(error = %e, code = ?e.code(), request_id = ?e.request_id(), "Conversation listing failed");
                DispatchError::Listing(e)
            })?;
            conversation_ids.extend(ids);
        }
        info!(count = conversation_ids.len(), "Listed joined conversations");
        Ok(conversation_ids)
    }

    /// Sends `body` as text to every joined conversation. Only a listing failure is an error;
    /// send failures are recorded in the report.
    #[instrument(skip(self, body))]
    pub async fn broadcast(&self, body: &str) -> Result<BroadcastReport, DispatchError> {
        let conversation_ids = self.list_joined_conversations().await?;
        let content = OutboundContent::text(body);
        let mut report = BroadcastReport::default();

        for conversation_id in conversation_ids {
            let result = match self.send(&conversation_id, &content).await {
                Ok(()) => ConversationResult {
                    conversation_id,
                    status: SendStatus::Success,
                    error: None,
                },
                Err(e) => ConversationResult {
                    conversation_id,
                    status: SendStatus::Failed,
                    error: Some(e.to_string()),
                },
            };
            report.record(result);
        }

        info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "Broadcast finished"
        );
        Ok(report)
    }

    /// Sends `body` to the most recently active conversation. `Ok(None)` when none has been seen.
    #[instrument(skip(self, body))]
    pub async fn send_to_current(&self, body: &str) -> Result<Option<ConversationResult>, DispatchError> {
        let Some(snapshot) = self.tracker.current().await else {
            info!("No conversation observed yet; nothing to send to");
            return Ok(None);
        };
        let content = OutboundContent::text(body);
        self.send(&snapshot.conversation_id, &content)
            .await
            .map_err(|source| DispatchError::Send {
                conversation_id: snapshot.conversation_id.clone(),
                source,
            })?;
        Ok(Some(ConversationResult {
            conversation_id: snapshot.conversation_id,
            status: SendStatus::Success,
            error: None,
        }))
    }

    async fn send(&self, conversation_id: &str, content: &OutboundContent) -> Result<(), BridgeError> {
        match self.messenger.create_message(conversation_id, content).await {
            Ok(receipt) => {
                info!(conversation_id = %conversation_id, message_id = ?receipt.message_id, "Message sent");
                self.persist(conversation_id, &receipt, content).await;
                Ok(())
            }
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    code = ?e.code(),
                    request_id = ?e.request_id(),
                    "Send failed"
                );
                Err(e)
            }
        }
    }

    async fn persist(&self, conversation_id: &str, receipt: &SendReceipt, content: &OutboundContent) {
        let Some(message_id) = receipt.message_id.as_deref() else {
            return;
        };
        let record = NewMessage::outbound(conversation_id, message_id, &content.msg_type, &content.content);
        if let Err(e) = self.store.put(&record).await {
            error!(error = %e, platform_message_id = %message_id, "Failed to save sent message");
        }
    }
}
