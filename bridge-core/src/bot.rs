//! Outbound capability of the remote platform.
//!
//! [`Messenger`] is transport-agnostic; `bridge_lark::LarkClient` implements it over the Lark REST API and tests substitute recording mocks.

use crate::error::Result;
use crate::types::{ConversationPage, OutboundContent, SendReceipt};
use async_trait::async_trait;

/// Create/reply sends plus the paginated listing of conversations the bot belongs to.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Creates a new message addressed to the conversation id.
    async fn create_message(
        &self,
        conversation_id: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt>;

    /// Replies to an existing message by its platform message id.
    async fn reply_message(
        &self,
        message_id: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt>;

    /// Fetches one page of joined conversations. `page_token` is the opaque cursor from the previous page.
    async fn list_conversations(
        &self,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage>;
}
