//! Integration tests for the webhook event source router.
//!
//! Drives the axum router with `tower::ServiceExt::oneshot` and inspects what lands on the event channel.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bridge_core::InboundEvent;
use bridge_lark::webhook::{routes, WebhookState, WEBHOOK_PATH};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn message_callback(token: &str) -> Value {
    json!({
        "schema": "2.0",
        "header": { "event_type": "im.message.receive_v1", "token": token },
        "event": {
            "message": {
                "message_id": "om_1",
                "chat_id": "oc_1",
                "chat_type": "group",
                "message_type": "text",
                "content": "{\"text\":\"hi\"}"
            }
        }
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_challenge_is_echoed() {
    let (tx, _rx) = mpsc::channel::<InboundEvent>(4);
    let app = routes(WebhookState::new(Some("vt".to_string()), tx));

    let response = app
        .oneshot(post(
            json!({ "challenge": "abc", "token": "vt", "type": "url_verification" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "challenge": "abc" }));
}

#[tokio::test]
async fn test_message_event_is_queued() {
    let (tx, mut rx) = mpsc::channel::<InboundEvent>(4);
    let app = routes(WebhookState::new(Some("vt".to_string()), tx));

    let response = app
        .oneshot(post(message_callback("vt").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let event = rx.try_recv().expect("event should be queued");
    assert_eq!(event.conversation_id.as_deref(), Some("oc_1"));
    assert_eq!(event.platform_message_id.as_deref(), Some("om_1"));
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let (tx, mut rx) = mpsc::channel::<InboundEvent>(4);
    let app = routes(WebhookState::new(Some("vt".to_string()), tx));

    let response = app
        .oneshot(post(message_callback("forged").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(rx.try_recv().is_err());
}

/// **Test: Callbacks with nothing to queue are acknowledged even when the consumer is gone.**
///
/// **Setup:** No verification token; receiver dropped.
/// **Expected:** Non-JSON body and non-message event get 200.
#[tokio::test]
async fn test_acknowledges_non_message_callbacks() {
    let (tx, rx) = mpsc::channel::<InboundEvent>(4);
    drop(rx);
    let app = routes(WebhookState::new(None, tx));

    for body in [
        "not json".to_string(),
        json!({ "header": { "event_type": "im.chat.disbanded_v1" } }).to_string(),
    ] {
        let response = app.clone().oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

/// **Test: A message that cannot be queued is refused with 503 so it gets redelivered.**
///
/// **Setup:** Receiver closed, as after shutdown.
/// **Expected:** Message callback answered 503.
#[tokio::test]
async fn test_message_refused_when_consumer_stopped() {
    let (tx, mut rx) = mpsc::channel::<InboundEvent>(4);
    rx.close();
    let app = routes(WebhookState::new(None, tx));

    let response = app
        .oneshot(post(message_callback("anything").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
