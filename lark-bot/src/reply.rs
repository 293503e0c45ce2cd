//! Inbound payload parsing and reply composition.
//!
//! Parsing is a typed result: a [`ParseFailure`] maps to the fixed fallback notice through
//! [`fallback_text`], so the reply step never depends on error handling side effects.

use bridge_core::{OutboundContent, TEXT_KIND};
use std::collections::HashMap;
use thiserror::Error;

/// Sent in place of the user's text when the payload can't be read as text.
pub const FALLBACK_TEXT: &str = "解析消息失败，请发送文本消息\nparse message failed, please send text message";

/// Display text extracted from a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("message has no content")]
    MissingBody,

    #[error("message kind {kind:?} is not text")]
    NotText { kind: Option<String> },

    #[error("content is not a text payload: {0}")]
    InvalidPayload(String),
}

/// Extracts `text` from a text message payload such as `{"text":"hi"}`.
///
/// The payload must be a JSON object of string values. An object without `text` yields empty text.
pub fn parse_text(kind: Option<&str>, body: Option<&str>) -> Result<ParsedText, ParseFailure> {
    if kind != Some(TEXT_KIND) {
        return Err(ParseFailure::NotText {
            kind: kind.map(str::to_string),
        });
    }
    let body = body.ok_or(ParseFailure::MissingBody)?;
    let mut fields: HashMap<String, String> =
        serde_json::from_str(body).map_err(|e| ParseFailure::InvalidPayload(e.to_string()))?;
    Ok(ParsedText {
        text: fields.remove("text").unwrap_or_default(),
    })
}

pub fn fallback_text(_failure: &ParseFailure) -> &'static str {
    FALLBACK_TEXT
}

/// Text to embed in the reply: the parsed text, or the fallback notice.
pub fn display_text(kind: Option<&str>, body: Option<&str>) -> String {
    match parse_text(kind, body) {
        Ok(parsed) => parsed.text,
        Err(failure) => {
            tracing::warn!(reason = %failure, "Falling back to parse-failure notice");
            fallback_text(&failure).to_string()
        }
    }
}

/// The two reply lines, Chinese first.
pub fn reply_lines(text: &str) -> [String; 2] {
    [
        format!("收到你发送的消息: {}", text),
        format!("Received message: {}", text),
    ]
}

/// Text content carrying both reply lines.
pub fn compose_reply(text: &str) -> OutboundContent {
    OutboundContent::text_lines(reply_lines(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_payload() {
        let parsed = parse_text(Some("text"), Some(r#"{"text":"hello"}"#)).unwrap();
        assert_eq!(parsed.text, "hello");
    }

    #[test]
    fn test_parse_object_without_text_is_empty() {
        let parsed = parse_text(Some("text"), Some(r#"{"other":"x"}"#)).unwrap();
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(
            parse_text(Some("image"), Some(r#"{"image_key":"k"}"#)),
            Err(ParseFailure::NotText {
                kind: Some("image".to_string())
            })
        );
        assert_eq!(
            parse_text(None, Some(r#"{"text":"hi"}"#)),
            Err(ParseFailure::NotText { kind: None })
        );
        assert_eq!(parse_text(Some("text"), None), Err(ParseFailure::MissingBody));
        assert!(matches!(
            parse_text(Some("text"), Some("not json")),
            Err(ParseFailure::InvalidPayload(_))
        ));
        // Non-string values are not a text payload.
        assert!(matches!(
            parse_text(Some("text"), Some(r#"{"text":1}"#)),
            Err(ParseFailure::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_fallback_is_fixed() {
        for failure in [
            ParseFailure::MissingBody,
            ParseFailure::NotText { kind: None },
            ParseFailure::InvalidPayload("x".to_string()),
        ] {
            assert_eq!(fallback_text(&failure), FALLBACK_TEXT);
        }
        assert_eq!(display_text(Some("post"), Some("{}")), FALLBACK_TEXT);
    }

    #[test]
    fn test_compose_reply_two_lines() {
        let content = compose_reply("hi");
        assert_eq!(content.msg_type, "text");
        let value: serde_json::Value = serde_json::from_str(&content.content).unwrap();
        assert_eq!(value["text"], "收到你发送的消息: hi\nReceived message: hi");
    }
}
