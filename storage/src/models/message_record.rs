//! Message models for persistence.
//!
//! [`MessageRecord`] maps to a row of the `messages` table; [`NewMessage`] is what callers hand to `MessageStore::put`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    User,
    Bot,
}

impl SenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::User => "user",
            SenderKind::Bot => "bot",
        }
    }
}

/// A stored message. `id` is the store-assigned sequence number.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: String,
    pub platform_message_id: String,
    pub sender_id: String,
    pub sender_kind: String,
    pub body: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// A message to upsert, keyed by `platform_message_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: String,
    pub platform_message_id: String,
    pub sender_id: String,
    pub sender_kind: SenderKind,
    pub body: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    /// An inbound user message stamped with the current time.
    ///
    /// The sender is always recorded as the `user` role with an empty sender id; inbound events do not carry a usable sender.
    pub fn inbound(
        conversation_id: impl Into<String>,
        platform_message_id: impl Into<String>,
        kind: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            platform_message_id: platform_message_id.into(),
            sender_id: String::new(),
            sender_kind: SenderKind::User,
            body: body.into(),
            kind: kind.into(),
            created_at: Utc::now(),
        }
    }

    /// A message the bot sent, stamped with the current time.
    pub fn outbound(
        conversation_id: impl Into<String>,
        platform_message_id: impl Into<String>,
        kind: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender_kind: SenderKind::Bot,
            ..Self::inbound(conversation_id, platform_message_id, kind, body)
        }
    }

    /// Overrides the timestamp (platform clock, or tests needing a fixed order).
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
