//! Adapter from Lark event callbacks to [`bridge_core::InboundEvent`].
//! Depends only on the payload shape and bridge_core type definitions.

use bridge_core::InboundEvent;
use serde_json::Value;

/// Event type of a received chat message (schema 2.0).
pub const MESSAGE_RECEIVE_EVENT: &str = "im.message.receive_v1";

fn string_at(payload: &Value, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Converts a message-receive callback into an event. Returns None for any other event type.
/// Individual fields stay None when absent; the router decides what to skip.
pub fn parse_event_payload(payload: &Value) -> Option<InboundEvent> {
    let event_type = payload
        .pointer("/header/event_type")
        .and_then(|e| e.as_str())
        .unwrap_or("");
    if event_type != MESSAGE_RECEIVE_EVENT {
        return None;
    }

    Some(InboundEvent {
        conversation_id: string_at(payload, "/event/message/chat_id"),
        platform_message_id: string_at(payload, "/event/message/message_id"),
        message_kind: string_at(payload, "/event/message/message_type"),
        conversation_kind: string_at(payload, "/event/message/chat_type"),
        body: payload
            .pointer("/event/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string),
    })
}

/// Verification token of a callback: `header.token` for schema 2.0, top-level `token` otherwise.
pub fn callback_token(payload: &Value) -> Option<&str> {
    payload
        .pointer("/header/token")
        .or_else(|| payload.get("token"))
        .and_then(|t| t.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receive_payload(message: Value) -> Value {
        json!({
            "schema": "2.0",
            "header": { "event_type": "im.message.receive_v1", "token": "vt" },
            "event": {
                "sender": { "sender_id": { "open_id": "ou_1" }, "sender_type": "user" },
                "message": message
            }
        })
    }

    /// **Test: A full text message maps every field.**
    #[test]
    fn test_parse_text_message() {
        let payload = receive_payload(json!({
            "message_id": "om_1",
            "chat_id": "oc_1",
            "chat_type": "p2p",
            "message_type": "text",
            "content": "{\"text\":\"hello\"}",
            "create_time": "1735732800000"
        }));

        let event = parse_event_payload(&payload).expect("message event");

        assert_eq!(event.conversation_id.as_deref(), Some("oc_1"));
        assert_eq!(event.platform_message_id.as_deref(), Some("om_1"));
        assert_eq!(event.message_kind.as_deref(), Some("text"));
        assert_eq!(event.conversation_kind.as_deref(), Some("p2p"));
        assert_eq!(event.body.as_deref(), Some("{\"text\":\"hello\"}"));
    }

    /// **Test: Missing fields stay None instead of rejecting the event.**
    #[test]
    fn test_parse_missing_fields() {
        let payload = receive_payload(json!({ "message_type": "image" }));

        let event = parse_event_payload(&payload).expect("message event");

        assert!(event.conversation_id.is_none());
        assert!(event.platform_message_id.is_none());
        assert!(event.body.is_none());
        assert_eq!(event.message_kind.as_deref(), Some("image"));
    }

    #[test]
    fn test_parse_other_event_type_is_ignored() {
        let payload = json!({
            "schema": "2.0",
            "header": { "event_type": "im.chat.member.bot.added_v1" },
            "event": {}
        });
        assert!(parse_event_payload(&payload).is_none());
        assert!(parse_event_payload(&json!({})).is_none());
    }

    #[test]
    fn test_callback_token_locations() {
        assert_eq!(callback_token(&receive_payload(json!({}))), Some("vt"));
        assert_eq!(
            callback_token(&json!({ "challenge": "c", "token": "legacy" })),
            Some("legacy")
        );
        assert_eq!(callback_token(&json!({ "challenge": "c" })), None);
    }
}
