//! Webhook event source: Lark posts event callbacks here and each message event is queued for the router.
//!
//! The endpoint answers 200 once a message is queued, whether or not downstream processing later succeeds.
//! A mismatching verification token gets 403; a message that cannot be queued because the consumer has
//! stopped gets 503 so the platform redelivers it.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bridge_core::InboundEvent;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapters::{callback_token, parse_event_payload};

/// Path Lark is configured to call.
pub const WEBHOOK_PATH: &str = "/webhook/event";

#[derive(Clone)]
pub struct WebhookState {
    verification_token: Option<String>,
    tx: mpsc::Sender<InboundEvent>,
}

impl WebhookState {
    pub fn new(verification_token: Option<String>, tx: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            verification_token,
            tx,
        }
    }

    fn token_ok(&self, payload: &Value) -> bool {
        match &self.verification_token {
            None => true,
            Some(expected) => callback_token(payload) == Some(expected.as_str()),
        }
    }
}

/// Router exposing [`WEBHOOK_PATH`].
pub fn routes(state: WebhookState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle_event))
        .with_state(state)
}

async fn handle_event(State(state): State<WebhookState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Ignoring callback with non-JSON body");
            return (StatusCode::OK, "ok").into_response();
        }
    };

    if payload.get("encrypt").is_some() {
        warn!("Encrypted callbacks are not supported; disable encryption in the app console");
        return (StatusCode::OK, "ok").into_response();
    }

    if !state.token_ok(&payload) {
        warn!("Rejecting callback with invalid verification token");
        return (StatusCode::FORBIDDEN, "invalid token").into_response();
    }

    if let Some(challenge) = payload.get("challenge").and_then(|c| c.as_str()) {
        info!("Answering URL verification challenge");
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "challenge": challenge })),
        )
            .into_response();
    }

    match parse_event_payload(&payload) {
        Some(event) => {
            debug!(
                conversation_id = ?event.conversation_id,
                platform_message_id = ?event.platform_message_id,
                "Queueing inbound event"
            );
            if state.tx.send(event).await.is_err() {
                warn!("Event consumer stopped; asking the platform to redeliver");
                return (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response();
            }
        }
        None => debug!("Ignoring non-message callback"),
    }

    (StatusCode::OK, "ok").into_response()
}
