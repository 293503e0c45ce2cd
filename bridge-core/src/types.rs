//! Core types: inbound event, conversation kind and snapshot, outbound content, handler response, and Handler trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message kind the platform uses for plain text.
pub const TEXT_KIND: &str = "text";

/// Peer-to-peer or group conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    P2p,
    Group,
}

impl ConversationKind {
    /// Normalises the platform's chat type. Only `p2p` is peer-to-peer; anything else, including absence, is a group.
    pub fn from_platform(chat_type: Option<&str>) -> Self {
        match chat_type {
            Some("p2p") => ConversationKind::P2p,
            _ => ConversationKind::Group,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::P2p => "p2p",
            ConversationKind::Group => "group",
        }
    }
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    pub conversation_kind: ConversationKind,
}

/// One inbound message event as delivered by the platform. Every field is optional; the router decides what it can do without each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: Option<String>,
    pub platform_message_id: Option<String>,
    pub message_kind: Option<String>,
    /// Raw chat type as sent by the platform (e.g. "p2p", "group").
    pub conversation_kind: Option<String>,
    /// Raw content payload, normally a JSON object such as `{"text":"hi"}`.
    pub body: Option<String>,
}

impl InboundEvent {
    pub fn kind(&self) -> ConversationKind {
        ConversationKind::from_platform(self.conversation_kind.as_deref())
    }
}

/// Message kind plus serialized content, ready for the outbound send capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundContent {
    pub msg_type: String,
    pub content: String,
}

impl OutboundContent {
    /// Text content with one entry per line, serialized as `{"text":"line1\nline2"}`.
    pub fn text_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            msg_type: TEXT_KIND.to_string(),
            content: serde_json::json!({ "text": text }).to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::text_lines([text])
    }
}

/// Successful outbound send. `message_id` is the platform id of the created message, when returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// One page of the joined-conversation listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPage {
    pub conversation_ids: Vec<String>,
    pub page_token: Option<String>,
    pub has_more: bool,
}

/// Handler result for the chain. `Reply(text)` carries the sent body so later handlers can use it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Skip this handler, try next.
    Ignore,
    /// Stop the chain and attach the reply text.
    Reply(String),
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop/Reply → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _event: &InboundEvent) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the event. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _event: &InboundEvent) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _event: &InboundEvent,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_kind_only_p2p_is_peer_to_peer() {
        assert_eq!(ConversationKind::from_platform(Some("p2p")), ConversationKind::P2p);
        assert_eq!(ConversationKind::from_platform(Some("group")), ConversationKind::Group);
        assert_eq!(ConversationKind::from_platform(Some("topic_group")), ConversationKind::Group);
        assert_eq!(ConversationKind::from_platform(None), ConversationKind::Group);
    }

    #[test]
    fn test_text_lines_serializes_joined_text() {
        let content = OutboundContent::text_lines(["first", "second"]);
        assert_eq!(content.msg_type, "text");
        let value: serde_json::Value = serde_json::from_str(&content.content).unwrap();
        assert_eq!(value["text"], "first\nsecond");
    }

    #[test]
    fn test_text_escapes_quotes() {
        let content = OutboundContent::text("say \"hi\"");
        let value: serde_json::Value = serde_json::from_str(&content.content).unwrap();
        assert_eq!(value["text"], "say \"hi\"");
    }
}
