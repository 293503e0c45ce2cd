//! Mock implementation of [`bridge_core::Messenger`] for integration tests.
//!
//! Records every create/reply call so tests can assert on targets and content without hitting Lark.
//! Listing pages and per-conversation send failures are configured up front.

use async_trait::async_trait;
use bridge_core::{BridgeError, ConversationPage, Messenger, OutboundContent, Result, SendReceipt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Which send operation was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOp {
    Create,
    Reply,
}

/// One recorded send. `target` is the conversation id for Create and the message id for Reply.
#[derive(Debug, Clone)]
pub struct SendRecord {
    pub op: SendOp,
    pub target: String,
    pub content: OutboundContent,
}

impl SendRecord {
    /// The `text` field of the serialized content.
    pub fn text(&self) -> String {
        let value: serde_json::Value = serde_json::from_str(&self.content.content).unwrap();
        value["text"].as_str().unwrap().to_string()
    }
}

#[derive(Default)]
pub struct MockMessenger {
    sends: Mutex<Vec<SendRecord>>,
    /// Targets whose sends fail with a remote error.
    failing: HashSet<String>,
    /// Listing pages, served in order; cursor is the page index as a string.
    pages: Vec<Vec<String>>,
    /// Page index whose fetch fails, if any.
    failing_page: Option<usize>,
    list_calls: AtomicUsize,
    counter: AtomicUsize,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.pages = pages
            .into_iter()
            .map(|p| p.into_iter().map(str::to_string).collect())
            .collect();
        self
    }

    pub fn failing_for(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    pub fn failing_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn sends(&self) -> Vec<SendRecord> {
        self.sends.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn record(&self, op: SendOp, target: &str, content: &OutboundContent) -> Result<SendReceipt> {
        self.sends.lock().unwrap().push(SendRecord {
            op,
            target: target.to_string(),
            content: content.clone(),
        });
        if self.failing.contains(target) {
            return Err(BridgeError::Remote {
                code: 230002,
                message: format!("cannot send to {}", target),
                request_id: Some("req-mock".to_string()),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SendReceipt {
            message_id: Some(format!("om_sent_{}", n)),
        })
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn create_message(&self, conversation_id: &str, content: &OutboundContent) -> Result<SendReceipt> {
        self.record(SendOp::Create, conversation_id, content)
    }

    async fn reply_message(&self, message_id: &str, content: &OutboundContent) -> Result<SendReceipt> {
        self.record(SendOp::Reply, message_id, content)
    }

    async fn list_conversations(&self, page_token: Option<&str>, _page_size: u32) -> Result<ConversationPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        if self.failing_page == Some(index) {
            return Err(BridgeError::Transport("listing unavailable".to_string()));
        }
        let conversation_ids = self.pages.get(index).cloned().unwrap_or_default();
        let has_more = index + 1 < self.pages.len();
        Ok(ConversationPage {
            conversation_ids,
            page_token: has_more.then(|| (index + 1).to_string()),
            has_more,
        })
    }
}
