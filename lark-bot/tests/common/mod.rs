#![allow(dead_code)]

pub mod mock_messenger;

use bridge_core::InboundEvent;
use storage::MessageStore;

/// Fresh in-memory message store.
pub async fn memory_store() -> MessageStore {
    MessageStore::new("sqlite::memory:").await.unwrap()
}

/// A text message event as the webhook adapter would produce it.
pub fn text_event(conversation_id: &str, message_id: &str, chat_type: &str, text: &str) -> InboundEvent {
    InboundEvent {
        conversation_id: Some(conversation_id.to_string()),
        platform_message_id: Some(message_id.to_string()),
        message_kind: Some("text".to_string()),
        conversation_kind: Some(chat_type.to_string()),
        body: Some(serde_json::json!({ "text": text }).to_string()),
    }
}
