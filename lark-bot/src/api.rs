//! HTTP API: trigger a broadcast, send to the last active conversation, health check.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::broadcast::BroadcastDispatcher;

#[derive(Clone)]
pub struct ApiState {
    dispatcher: Arc<BroadcastDispatcher>,
    default_text: String,
}

impl ApiState {
    pub fn new(dispatcher: Arc<BroadcastDispatcher>, default_text: impl Into<String>) -> Self {
        Self {
            dispatcher,
            default_text: default_text.into(),
        }
    }

    fn content_or_default(&self, query: ContentQuery) -> String {
        query
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_text.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub content: Option<String>,
}

pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/send-message", get(send_message))
        .route("/api/send-recent", get(send_recent))
        .route("/health", get(health))
        .with_state(state)
}

async fn send_message(State(state): State<ApiState>, Query(query): Query<ContentQuery>) -> Response {
    let content = state.content_or_default(query);
    info!(content_len = content.len(), "Broadcast requested");

    match state.dispatcher.broadcast(&content).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "code": 200, "message": "消息发送完成", "data": report })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Broadcast failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "code": 500, "message": "发送消息失败", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn send_recent(State(state): State<ApiState>, Query(query): Query<ContentQuery>) -> Response {
    let content = state.content_or_default(query);

    match state.dispatcher.send_to_current(&content).await {
        Ok(Some(result)) => (
            StatusCode::OK,
            Json(json!({ "code": 200, "message": "消息发送完成", "data": result })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": 404, "message": "no active conversation" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Send to active conversation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "code": 500, "message": "发送消息失败", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "服务运行正常" }))
}
