//! Conversation tracker: the single most recently active conversation, shared between the event
//! path (writer) and the default-target send path (reader).

use bridge_core::{ConversationKind, ConversationSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Last-write-wins slot guarded by a reader/writer lock. Clones share the slot; separately
/// constructed trackers do not.
#[derive(Clone, Default)]
pub struct ConversationTracker {
    slot: Arc<RwLock<Option<ConversationSnapshot>>>,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the tracked snapshot.
    pub async fn update(&self, conversation_id: impl Into<String>, conversation_kind: ConversationKind) {
        let snapshot = ConversationSnapshot {
            conversation_id: conversation_id.into(),
            conversation_kind,
        };
        debug!(
            conversation_id = %snapshot.conversation_id,
            conversation_kind = %snapshot.conversation_kind,
            "Tracking active conversation"
        );
        *self.slot.write().await = Some(snapshot);
    }

    /// Latest snapshot, or None if no event has been observed yet.
    pub async fn current(&self) -> Option<ConversationSnapshot> {
        self.slot.read().await.clone()
    }
}
